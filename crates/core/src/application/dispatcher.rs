// Job Dispatcher
//
// Serializes a built configuration and submits it. Reachable directly
// (`post_job`) as well as through the request builders, so the service is
// re-resolved here through the shared validation module.

use crate::application::rpc::{self, names, AuthenticatedRpc};
use crate::application::validation;
use crate::domain::{CatalogSnapshot, JobId, WorkerFilter};
use crate::error::{Result, SelasError};
use serde::Serialize;
use serde_json::json;
use tracing::info;

/// Submit `config` to the service named `service_name`
///
/// Returns whatever job id the backend assigns. Does not wait for the job.
pub async fn dispatch<C: Serialize + ?Sized>(
    rpc: &AuthenticatedRpc,
    catalog: &CatalogSnapshot,
    service_name: &str,
    config: &C,
    worker_filter: &WorkerFilter,
) -> Result<JobId> {
    let service = validation::resolve_service(catalog, service_name)?;
    let job_config = serde_json::to_string(config)?;

    let data = rpc
        .call(
            names::POST_JOB,
            rpc::params(json!({
                "p_service_id": service.id,
                "p_job_config": job_config,
                "p_worker_filter": worker_filter,
            })),
        )
        .await?;

    let job_id = job_id_from_response(&data)?;

    info!(
        service = %service_name,
        job_id = %job_id,
        catalog_revision = catalog.revision(),
        "Job submitted"
    );

    Ok(job_id)
}

/// Extract the job id from a `post_job` result
///
/// Accepts a bare string/number or an object with `job_id` or `id`.
pub fn job_id_from_response(data: &serde_json::Value) -> Result<JobId> {
    if let Some(id) = rpc::value_to_text(data) {
        return Ok(id);
    }

    data.get("job_id")
        .or_else(|| data.get("id"))
        .and_then(rpc::value_to_text)
        .ok_or_else(|| {
            SelasError::UnexpectedResponse(format!("post_job returned no job id: {}", data))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Service, StableDiffusionConfig};
    use crate::error::ValidationError;
    use crate::port::rpc_transport::mocks::MockRpcTransport;
    use std::sync::Arc;

    fn rpc(transport: &MockRpcTransport) -> AuthenticatedRpc {
        AuthenticatedRpc::new(
            Arc::new(transport.clone()),
            Identity {
                app_id: "app".to_string(),
                key: "key".to_string(),
                app_user_id: "7".to_string(),
                app_user_token: "token".to_string(),
            },
        )
    }

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![Service::new("svc-uuid", "stable-diffusion-1-5", "stable-diffusion")],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_dispatch_sends_service_id_config_text_and_filter() {
        let transport = MockRpcTransport::new();
        transport.on(names::POST_JOB, json!("job-123"));

        let job_id = dispatch(
            &rpc(&transport),
            &catalog(),
            "stable-diffusion-1-5",
            &StableDiffusionConfig::default(),
            &WorkerFilter::production(),
        )
        .await
        .unwrap();

        assert_eq!(job_id, "job-123");

        let calls = transport.calls_to(names::POST_JOB);
        assert_eq!(calls.len(), 1);
        let params = &calls[0].params;
        assert_eq!(params["p_service_id"], json!("svc-uuid"));
        assert_eq!(params["p_worker_filter"], json!({"branch": "prod"}));

        let sent: StableDiffusionConfig =
            serde_json::from_str(params["p_job_config"].as_str().unwrap()).unwrap();
        assert_eq!(sent, StableDiffusionConfig::default());
    }

    #[tokio::test]
    async fn test_unknown_service_never_reaches_transport() {
        let transport = MockRpcTransport::new();

        let err = dispatch(
            &rpc(&transport),
            &catalog(),
            "missing",
            &StableDiffusionConfig::default(),
            &WorkerFilter::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            SelasError::Validation(ValidationError::UnknownService(_))
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_job_id_shapes() {
        assert_eq!(job_id_from_response(&json!("abc")).unwrap(), "abc");
        assert_eq!(job_id_from_response(&json!(991)).unwrap(), "991");
        assert_eq!(
            job_id_from_response(&json!({"job_id": "c97ac10a"})).unwrap(),
            "c97ac10a"
        );
        assert_eq!(job_id_from_response(&json!({"id": 5})).unwrap(), "5");
        assert!(job_id_from_response(&json!(null)).is_err());
    }
}
