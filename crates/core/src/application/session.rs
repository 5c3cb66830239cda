// Session Bootstrap
//
// resolve user id -> echo check -> services -> add-ons, strictly in order.

use crate::application::constants::CONNECTION_CHECK;
use crate::application::rpc::{self, names, AuthenticatedRpc};
use crate::domain::{AddOn, AppCredentials, CatalogSnapshot, Identity, Service};
use crate::error::{Result, SelasError};
use crate::port::{RpcParams, RpcTransport};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// A usable session: authenticated channel plus the initial catalog
pub struct Session {
    pub rpc: AuthenticatedRpc,
    pub catalog: CatalogSnapshot,
}

/// Step 1: resolve the external user id into the internal one.
///
/// This is the only call made without an internal user id.
pub async fn resolve_user_id(
    transport: &dyn RpcTransport,
    credentials: &AppCredentials,
) -> Result<String> {
    let data = transport
        .invoke(
            names::GET_USER_ID,
            rpc::params(json!({
                "p_app_id": credentials.app_id,
                "p_key": credentials.key,
                "p_app_user_external_id": credentials.app_user_external_id,
                "p_app_user_token": credentials.app_user_token,
            })),
        )
        .await
        .map_err(|err| SelasError::AuthResolution(err.message))?;

    match rpc::value_to_text(&data) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(SelasError::AuthResolution(format!(
            "no user id returned for external id {}",
            credentials.app_user_external_id
        ))),
    }
}

/// Step 2: send the check string and require it back unchanged
pub async fn test_connection(rpc: &AuthenticatedRpc) -> Result<()> {
    let data = rpc
        .call(
            names::ECHO,
            rpc::params(json!({ "message_app_user": CONNECTION_CHECK })),
        )
        .await
        .map_err(|err| SelasError::Connectivity(err.to_string()))?;

    match rpc::value_to_text(&data) {
        Some(echoed) if echoed == CONNECTION_CHECK => Ok(()),
        _ => Err(SelasError::Connectivity(format!(
            "echo check returned {}",
            data
        ))),
    }
}

/// Fetch the service catalog; `None` when the backend returned nothing
pub async fn fetch_services(rpc: &AuthenticatedRpc) -> Result<Option<Vec<Service>>> {
    let data = rpc.call(names::GET_SERVICES, RpcParams::new()).await?;
    if data.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(data)?))
}

/// Fetch the caller's add-ons; `None` when the backend returned nothing
pub async fn fetch_add_ons(rpc: &AuthenticatedRpc) -> Result<Option<Vec<AddOn>>> {
    let data = rpc.call(names::GET_ADD_ONS, RpcParams::new()).await?;
    if data.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(data)?))
}

/// Run the four bootstrap steps
pub async fn bootstrap(
    transport: Arc<dyn RpcTransport>,
    credentials: &AppCredentials,
) -> Result<Session> {
    let app_user_id = resolve_user_id(transport.as_ref(), credentials).await?;
    debug!(app_user_id = %app_user_id, "Resolved app user");

    let rpc = AuthenticatedRpc::new(transport, Identity::resolved(credentials, app_user_id));

    test_connection(&rpc).await?;

    let services = fetch_services(&rpc).await?.unwrap_or_default();
    let add_ons = fetch_add_ons(&rpc).await?.unwrap_or_default();

    info!(
        app_id = %credentials.app_id,
        services = services.len(),
        add_ons = add_ons.len(),
        "Session ready"
    );

    Ok(Session {
        rpc,
        catalog: CatalogSnapshot::new(services, add_ons),
    })
}
