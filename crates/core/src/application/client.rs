// Selas Service - Client operations over an authenticated session

use crate::application::constants::DEFAULT_PATCH_TRAINER_SERVICE;
use crate::application::dispatcher;
use crate::application::request_builder::{self, PatchTrainerArgs, StableDiffusionArgs};
use crate::application::rpc::{self, names, AuthenticatedRpc};
use crate::application::session::{self, Session};
use crate::application::validation;
use crate::domain::job::{result_channel_name, RESULT_EVENT};
use crate::domain::{
    AddOn, AppCredentials, CatalogSnapshot, DatasetImage, JobId, JobResult, Service,
    ServiceInterface, WorkerFilter,
};
use crate::error::{Result, SelasError, ValidationError};
use crate::port::{ResultChannel, RpcParams, RpcTransport};
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Client for the job backend
///
/// Holds the authenticated RPC channel, the result channel and the current
/// catalog snapshot. Refreshing the catalog swaps in a whole new snapshot;
/// operations already holding the previous one keep validating against it.
pub struct SelasService {
    rpc: AuthenticatedRpc,
    channel: Arc<dyn ResultChannel>,
    worker_filter: WorkerFilter,
    catalog: RwLock<Arc<CatalogSnapshot>>,
}

impl SelasService {
    /// Bootstrap a session and return a ready client
    ///
    /// # Errors
    /// - `AuthResolution` if the user id cannot be resolved
    /// - `Connectivity` if the echo check fails
    /// - any classified error from the catalog fetches
    pub async fn connect(
        transport: Arc<dyn RpcTransport>,
        channel: Arc<dyn ResultChannel>,
        credentials: &AppCredentials,
        worker_filter: WorkerFilter,
    ) -> Result<Self> {
        let Session { rpc, catalog } = session::bootstrap(transport, credentials).await?;

        Ok(Self {
            rpc,
            channel,
            worker_filter,
            catalog: RwLock::new(Arc::new(catalog)),
        })
    }

    /// The current catalog snapshot
    pub fn catalog(&self) -> Arc<CatalogSnapshot> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn worker_filter(&self) -> &WorkerFilter {
        &self.worker_filter
    }

    pub fn app_user_id(&self) -> &str {
        &self.rpc.identity().app_user_id
    }

    fn replace_catalog(
        &self,
        update: impl FnOnce(&CatalogSnapshot) -> CatalogSnapshot,
    ) -> Arc<CatalogSnapshot> {
        let mut guard = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(update(guard.as_ref()));
        *guard = next.clone();
        next
    }

    /// Send `message` through the echo procedure and return what came back
    pub async fn echo(&self, message: &str) -> Result<String> {
        let data = self
            .rpc
            .call(names::ECHO, rpc::params(json!({ "message_app_user": message })))
            .await?;
        rpc::value_to_text(&data)
            .ok_or_else(|| SelasError::UnexpectedResponse(format!("echo returned {}", data)))
    }

    pub async fn get_app_user_credits(&self) -> Result<serde_json::Value> {
        self.rpc.call(names::GET_CREDITS, RpcParams::new()).await
    }

    pub async fn get_app_user_job_history(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<serde_json::Value> {
        self.rpc
            .call(
                names::GET_JOB_HISTORY,
                rpc::params(json!({ "p_limit": limit, "p_offset": offset })),
            )
            .await
    }

    /// Re-fetch the service catalog
    pub async fn get_service_list(&self) -> Result<Vec<Service>> {
        if let Some(services) = session::fetch_services(&self.rpc).await? {
            self.replace_catalog(|current| current.with_services(services));
        }
        Ok(self.catalog().services().to_vec())
    }

    /// Re-fetch the add-on catalog and return the new snapshot
    pub async fn update_add_on_list(&self) -> Result<Arc<CatalogSnapshot>> {
        match session::fetch_add_ons(&self.rpc).await? {
            Some(add_ons) => Ok(self.replace_catalog(|current| current.with_add_ons(add_ons))),
            None => Ok(self.catalog()),
        }
    }

    /// Re-fetch the add-on catalog
    pub async fn get_add_on_list(&self) -> Result<Vec<AddOn>> {
        Ok(self.update_add_on_list().await?.add_ons().to_vec())
    }

    /// Re-fetch both catalogs
    pub async fn refresh_catalog(&self) -> Result<Arc<CatalogSnapshot>> {
        let services = session::fetch_services(&self.rpc).await?;
        let add_ons = session::fetch_add_ons(&self.rpc).await?;

        Ok(self.replace_catalog(|current| {
            let services = services.unwrap_or_else(|| current.services().to_vec());
            let add_ons = add_ons.unwrap_or_else(|| current.add_ons().to_vec());
            current.with_catalogs(services, add_ons)
        }))
    }

    /// Submit an already-built configuration to `service_name`
    pub async fn post_job<C: Serialize + ?Sized>(
        &self,
        service_name: &str,
        job_config: &C,
    ) -> Result<JobId> {
        let catalog = self.catalog();
        dispatcher::dispatch(
            &self.rpc,
            &catalog,
            service_name,
            job_config,
            &self.worker_filter,
        )
        .await
    }

    /// Register `callback` for the result of `job_id`
    ///
    /// The callback runs at most once.
    pub async fn subscribe_to_job<F>(&self, job_id: &str, callback: F) -> Result<()>
    where
        F: FnOnce(JobResult) + Send + 'static,
    {
        let channel = result_channel_name(job_id);
        self.channel
            .bind(&channel, RESULT_EVENT, Box::new(callback))
            .await?;
        info!(job_id = %job_id, channel = %channel, "Subscribed to job result");
        Ok(())
    }

    /// Price a serialized job configuration without submitting it
    pub async fn get_service_config_cost(
        &self,
        service_name: &str,
        job_config: &str,
    ) -> Result<serde_json::Value> {
        let catalog = self.catalog();
        let service = validation::resolve_service(&catalog, service_name)?;

        self.rpc
            .call(
                names::GET_CONFIG_COST,
                rpc::params(json!({
                    "p_service_id": service.id,
                    "p_config": job_config,
                })),
            )
            .await
    }

    /// Price a configuration value without submitting it
    pub async fn get_config_cost<C: Serialize + ?Sized>(
        &self,
        service_name: &str,
        job_config: &C,
    ) -> Result<serde_json::Value> {
        let job_config = serde_json::to_string(job_config)?;
        self.get_service_config_cost(service_name, &job_config).await
    }

    /// Build and submit an image-generation job
    pub async fn run_stable_diffusion(
        &self,
        prompt: &str,
        args: &StableDiffusionArgs,
    ) -> Result<JobId> {
        let catalog = self.catalog();
        let built = request_builder::build_stable_diffusion(prompt, args, &catalog)?;

        dispatcher::dispatch(
            &self.rpc,
            &catalog,
            &built.service_name,
            &built.config,
            &self.worker_filter,
        )
        .await
    }

    /// Build and submit a patch-training job
    ///
    /// The trainer service is checked against the current snapshot before
    /// the add-on list is refreshed; the name must be neither taken nor
    /// currently being created.
    pub async fn run_patch_trainer(
        &self,
        dataset: Vec<DatasetImage>,
        patch_name: &str,
        args: &PatchTrainerArgs,
    ) -> Result<JobId> {
        let service_name = args
            .service_name
            .as_deref()
            .unwrap_or(DEFAULT_PATCH_TRAINER_SERVICE);
        validation::resolve_service_with_interface(
            &self.catalog(),
            service_name,
            &ServiceInterface::TrainPatchStableDiffusion,
        )?;

        let catalog = self.update_add_on_list().await?;
        let built = request_builder::build_patch_trainer(dataset, patch_name, args, &catalog)?;

        if self.is_creating_add_on(patch_name).await? {
            warn!(patch_name = %patch_name, "Add-on is already being created");
            return Err(ValidationError::AddOnCreationInProgress(patch_name.to_string()).into());
        }

        dispatcher::dispatch(
            &self.rpc,
            &catalog,
            &built.service_name,
            &built.config,
            &self.worker_filter,
        )
        .await
    }

    /// Whether a patch with this name is being trained right now
    pub async fn is_creating_add_on(&self, name: &str) -> Result<bool> {
        let data = self
            .rpc
            .call(
                names::IS_CREATING_ADD_ON,
                rpc::params(json!({ "p_add_on_name": name })),
            )
            .await?;
        match data {
            serde_json::Value::Bool(creating) => Ok(creating),
            serde_json::Value::Null => Ok(false),
            other => Err(SelasError::UnexpectedResponse(format!(
                "is_creating_add_on returned {}",
                other
            ))),
        }
    }

    /// Fetch the stored output of a job. Safe to call repeatedly.
    pub async fn get_result(&self, job_id: &str) -> Result<JobResult> {
        let data = self
            .rpc
            .call(names::GET_RESULT, rpc::params(json!({ "p_job_id": job_id })))
            .await?;
        Ok(JobResult::new(data))
    }

    /// Number of active workers matching this client's worker filter
    pub async fn get_count_active_worker(&self) -> Result<u64> {
        let data = self
            .rpc
            .call(
                names::COUNT_ACTIVE_WORKERS,
                rpc::params(json!({ "p_worker_filter": self.worker_filter })),
            )
            .await?;
        data.as_u64().ok_or_else(|| {
            SelasError::UnexpectedResponse(format!("worker count returned {}", data))
        })
    }

    /// Share one of the caller's add-ons with another app user
    pub async fn share_add_on(
        &self,
        name: &str,
        app_user_external_id: &str,
    ) -> Result<serde_json::Value> {
        validation::resolve_add_on(&self.catalog(), name)?;

        self.rpc
            .call(
                names::SHARE_ADD_ON,
                rpc::params(json!({
                    "p_add_on_name": name,
                    "p_app_user_external_id": app_user_external_id,
                })),
            )
            .await
    }

    /// Delete one of the caller's add-ons
    pub async fn delete_add_on(&self, name: &str) -> Result<()> {
        validation::resolve_add_on(&self.catalog(), name)?;

        self.rpc
            .call(
                names::DELETE_ADD_ON,
                rpc::params(json!({ "p_add_on_name": name })),
            )
            .await?;
        info!(add_on = %name, "Add-on deleted");

        self.update_add_on_list().await?;
        Ok(())
    }

    /// Rename one of the caller's add-ons
    pub async fn rename_add_on(&self, old_name: &str, new_name: &str) -> Result<()> {
        let catalog = self.catalog();
        validation::resolve_add_on(&catalog, old_name)?;
        validation::ensure_add_on_name_available(&catalog, new_name)?;

        self.rpc
            .call(
                names::RENAME_ADD_ON,
                rpc::params(json!({
                    "p_old_name": old_name,
                    "p_new_name": new_name,
                })),
            )
            .await?;
        info!(from = %old_name, to = %new_name, "Add-on renamed");

        self.update_add_on_list().await?;
        Ok(())
    }
}
