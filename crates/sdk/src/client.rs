//! Selas Client Implementation

use crate::config::{credentials_from_env, ClientConfig};
use crate::error::Result;
use selas_core::application::{PatchTrainerArgs, StableDiffusionArgs};
use selas_core::domain::{
    AddOn, AppCredentials, CatalogSnapshot, DatasetImage, JobId, JobResult, Service,
    WorkerFilter,
};
use selas_core::port::{ResultChannel, RpcTransport};
use selas_core::SelasService;
use selas_infra_postgrest::PostgrestTransport;
use selas_infra_pusher::PusherChannel;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Selas Client
///
/// Provides a high-level interface to the Selas job backend: catalog
/// queries, job submission, pricing, result delivery and add-on management.
///
/// # Example
///
/// ```no_run
/// use selas_sdk::{AppCredentials, ClientConfig, SelasClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new("https://project.supabase.co", "anon-key", "pusher-key");
/// let credentials = AppCredentials::new("app-id", "app-key", "user-42", "user-token");
/// let client = SelasClient::connect(config, &credentials).await?;
/// # Ok(())
/// # }
/// ```
pub struct SelasClient {
    service: SelasService,
}

impl SelasClient {
    /// Connect to the backend and bootstrap a session
    ///
    /// Resolves the user id, checks the connection with an echo and loads
    /// the service and add-on catalogs.
    ///
    /// # Errors
    ///
    /// * `SdkError::Setup` if the HTTP client cannot be built
    /// * `SdkError::Client` with `AuthResolution`, `Connectivity` or a
    ///   classified remote error if bootstrap fails
    pub async fn connect(config: ClientConfig, credentials: &AppCredentials) -> Result<Self> {
        let transport = PostgrestTransport::new(&config.postgrest())?;
        let channel = PusherChannel::new(config.pusher());

        info!(
            backend = %config.backend_url,
            app_user = %credentials.app_user_external_id,
            "Connecting to Selas"
        );

        Self::with_ports(
            Arc::new(transport),
            Arc::new(channel),
            credentials,
            config.worker_filter,
        )
        .await
    }

    /// Connect using `SELAS_*` environment variables for both the
    /// configuration and the credentials
    ///
    /// ```no_run
    /// # use selas_sdk::SelasClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = SelasClient::from_env().await?;
    /// println!("Credits: {}", client.get_app_user_credits().await?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        let credentials = credentials_from_env()?;
        Self::connect(config, &credentials).await
    }

    /// Bootstrap over caller-supplied transport and result channel
    pub async fn with_ports(
        transport: Arc<dyn RpcTransport>,
        channel: Arc<dyn ResultChannel>,
        credentials: &AppCredentials,
        worker_filter: WorkerFilter,
    ) -> Result<Self> {
        let service = SelasService::connect(transport, channel, credentials, worker_filter).await?;
        Ok(Self { service })
    }

    /// The underlying service
    pub fn service(&self) -> &SelasService {
        &self.service
    }

    /// Current catalog snapshot (services and add-ons)
    pub fn catalog(&self) -> Arc<CatalogSnapshot> {
        self.service.catalog()
    }

    pub fn app_user_id(&self) -> &str {
        self.service.app_user_id()
    }

    pub fn worker_filter(&self) -> &WorkerFilter {
        self.service.worker_filter()
    }

    /// Echo a message through the backend
    pub async fn echo(&self, message: &str) -> Result<String> {
        Ok(self.service.echo(message).await?)
    }

    /// Remaining credits of the current user
    pub async fn get_app_user_credits(&self) -> Result<serde_json::Value> {
        Ok(self.service.get_app_user_credits().await?)
    }

    /// Past jobs of the current user, newest first
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of jobs to return
    /// * `offset` - Number of jobs to skip
    pub async fn get_app_user_job_history(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<serde_json::Value> {
        Ok(self.service.get_app_user_job_history(limit, offset).await?)
    }

    /// Re-fetch and return the available services
    pub async fn get_service_list(&self) -> Result<Vec<Service>> {
        Ok(self.service.get_service_list().await?)
    }

    /// Re-fetch and return the add-ons visible to the current user
    pub async fn get_add_on_list(&self) -> Result<Vec<AddOn>> {
        Ok(self.service.get_add_on_list().await?)
    }

    /// Re-fetch the add-ons and return the new snapshot
    pub async fn update_add_on_list(&self) -> Result<Arc<CatalogSnapshot>> {
        Ok(self.service.update_add_on_list().await?)
    }

    /// Re-fetch both catalogs
    pub async fn refresh_catalog(&self) -> Result<Arc<CatalogSnapshot>> {
        Ok(self.service.refresh_catalog().await?)
    }

    /// Submit a raw job configuration to a named service
    ///
    /// The config is sent as-is; prefer [`run_stable_diffusion`](Self::run_stable_diffusion)
    /// and [`run_patch_trainer`](Self::run_patch_trainer), which validate and
    /// fill in defaults.
    pub async fn post_job<C: Serialize + ?Sized>(
        &self,
        service_name: &str,
        job_config: &C,
    ) -> Result<JobId> {
        Ok(self.service.post_job(service_name, job_config).await?)
    }

    /// Call `callback` once when the result of `job_id` is pushed
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use selas_sdk::SelasClient;
    /// # async fn example(client: SelasClient) -> Result<(), Box<dyn std::error::Error>> {
    /// let (tx, rx) = tokio::sync::oneshot::channel();
    /// client
    ///     .subscribe_to_job("job-123", move |result| {
    ///         let _ = tx.send(result);
    ///     })
    ///     .await?;
    ///
    /// let result = rx.await?;
    /// println!("{}", result.as_value());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn subscribe_to_job<F>(&self, job_id: &str, callback: F) -> Result<()>
    where
        F: FnOnce(JobResult) + Send + 'static,
    {
        Ok(self.service.subscribe_to_job(job_id, callback).await?)
    }

    /// Price a job configuration given as JSON text
    pub async fn get_service_config_cost(
        &self,
        service_name: &str,
        job_config: &str,
    ) -> Result<serde_json::Value> {
        Ok(self
            .service
            .get_service_config_cost(service_name, job_config)
            .await?)
    }

    /// Price a typed job configuration
    pub async fn get_config_cost<C: Serialize + ?Sized>(
        &self,
        service_name: &str,
        job_config: &C,
    ) -> Result<serde_json::Value> {
        Ok(self.service.get_config_cost(service_name, job_config).await?)
    }

    /// Generate images from a prompt
    ///
    /// Omitted arguments take the documented defaults. Patches are checked
    /// against the add-on catalog before anything is sent.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use selas_sdk::{PatchConfig, SelasClient, StableDiffusionArgs};
    /// # async fn example(client: SelasClient) -> Result<(), Box<dyn std::error::Error>> {
    /// let args = StableDiffusionArgs {
    ///     steps: Some(40),
    ///     patches: vec![PatchConfig::new("f-compo").with_alpha_unet(0.8)],
    ///     ..Default::default()
    /// };
    /// let job_id = client.run_stable_diffusion("a cat in a spacesuit", &args).await?;
    /// println!("Job ID: {}", job_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_stable_diffusion(
        &self,
        prompt: &str,
        args: &StableDiffusionArgs,
    ) -> Result<JobId> {
        Ok(self.service.run_stable_diffusion(prompt, args).await?)
    }

    /// Train a new patch from a labelled image dataset
    ///
    /// Fails with `AddOnAlreadyExists` if the name is taken and with
    /// `AddOnCreationInProgress` if a patch of that name is being trained.
    pub async fn run_patch_trainer(
        &self,
        dataset: Vec<DatasetImage>,
        patch_name: &str,
        args: &PatchTrainerArgs,
    ) -> Result<JobId> {
        Ok(self
            .service
            .run_patch_trainer(dataset, patch_name, args)
            .await?)
    }

    pub async fn is_creating_add_on(&self, name: &str) -> Result<bool> {
        Ok(self.service.is_creating_add_on(name).await?)
    }

    /// Fetch a job result without subscribing
    pub async fn get_result(&self, job_id: &str) -> Result<JobResult> {
        Ok(self.service.get_result(job_id).await?)
    }

    /// Number of active workers matching the configured worker filter
    pub async fn get_count_active_worker(&self) -> Result<u64> {
        Ok(self.service.get_count_active_worker().await?)
    }

    /// Share an add-on with another user of the same application
    pub async fn share_add_on(
        &self,
        name: &str,
        app_user_external_id: &str,
    ) -> Result<serde_json::Value> {
        Ok(self.service.share_add_on(name, app_user_external_id).await?)
    }

    pub async fn delete_add_on(&self, name: &str) -> Result<()> {
        Ok(self.service.delete_add_on(name).await?)
    }

    pub async fn rename_add_on(&self, old_name: &str, new_name: &str) -> Result<()> {
        Ok(self.service.rename_add_on(old_name, new_name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use selas_core::application::rpc::names;
    use selas_core::port::result_channel::mocks::MockResultChannel;
    use selas_core::port::rpc_transport::mocks::MockRpcTransport;
    use selas_core::{SelasError, ValidationError};
    use serde_json::json;
    use tokio_test::assert_ok;

    fn scripted_transport() -> MockRpcTransport {
        let transport = MockRpcTransport::new();
        transport
            .on(names::GET_USER_ID, json!("u-1"))
            .on(names::ECHO, json!("check"))
            .on(
                names::GET_SERVICES,
                json!([{"id": "s1", "name": "stable-diffusion-2-1-base", "interface": "stable-diffusion"}]),
            )
            .on(names::GET_ADD_ONS, json!([]));
        transport
    }

    async fn client(transport: &MockRpcTransport) -> Result<SelasClient> {
        SelasClient::with_ports(
            Arc::new(transport.clone()),
            Arc::new(MockResultChannel::new()),
            &AppCredentials::new("app", "key", "ext", "token"),
            WorkerFilter::production(),
        )
        .await
    }

    #[tokio::test]
    async fn test_with_ports_bootstraps() {
        let transport = scripted_transport();
        let client = assert_ok!(client(&transport).await);

        assert_eq!(client.app_user_id(), "u-1");
        assert_eq!(client.catalog().services().len(), 1);
        assert_eq!(client.worker_filter(), &WorkerFilter::production());
    }

    #[tokio::test]
    async fn test_bootstrap_failure_is_client_error() {
        let transport = scripted_transport();
        transport.on(names::ECHO, json!("nope"));

        let err = client(&transport).await.err().unwrap();
        assert!(matches!(
            err.as_client_error(),
            Some(SelasError::Connectivity(_))
        ));
    }

    #[tokio::test]
    async fn test_validation_error_passes_through() {
        let transport = scripted_transport();
        let client = client(&transport).await.unwrap();

        let args = StableDiffusionArgs {
            service_name: Some("no-such-service".to_string()),
            ..Default::default()
        };
        let err = client.run_stable_diffusion("x", &args).await.unwrap_err();

        assert!(matches!(
            err,
            SdkError::Client(SelasError::Validation(ValidationError::UnknownService(_)))
        ));
        assert!(!transport.was_called(names::POST_JOB));
    }
}
