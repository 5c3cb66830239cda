// Authenticated RPC Call
//
// Every call after bootstrap carries the four identity fields.

use crate::application::error_classifier;
use crate::domain::Identity;
use crate::error::Result;
use crate::port::{RpcParams, RpcTransport};
use std::sync::Arc;
use tracing::{debug, warn};

/// Remote procedure names
pub mod names {
    pub const GET_USER_ID: &str = "app_user_get_id";
    pub const ECHO: &str = "app_user_echo";
    pub const GET_SERVICES: &str = "app_user_get_services";
    pub const GET_ADD_ONS: &str = "app_user_get_add_ons";
    pub const GET_CREDITS: &str = "app_user_get_credits";
    pub const GET_JOB_HISTORY: &str = "app_user_get_job_history_detail";
    pub const POST_JOB: &str = "post_job";
    pub const GET_CONFIG_COST: &str = "get_service_config_cost_client";
    pub const GET_RESULT: &str = "app_user_get_result";
    pub const COUNT_ACTIVE_WORKERS: &str = "app_user_get_count_active_worker";
    pub const IS_CREATING_ADD_ON: &str = "app_user_is_creating_add_on";
    pub const SHARE_ADD_ON: &str = "app_user_share_add_on";
    pub const DELETE_ADD_ON: &str = "app_user_delete_add_on";
    pub const RENAME_ADD_ON: &str = "app_user_rename_add_on";
}

/// Turn a `json!({...})` object into call parameters.
///
/// Non-object values yield an empty parameter bag.
pub fn params(value: serde_json::Value) -> RpcParams {
    match value {
        serde_json::Value::Object(map) => map,
        _ => RpcParams::new(),
    }
}

/// Render a scalar result as text (strings verbatim, numbers in decimal)
pub fn value_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// RPC channel bound to a resolved identity
#[derive(Clone)]
pub struct AuthenticatedRpc {
    transport: Arc<dyn RpcTransport>,
    identity: Identity,
}

impl AuthenticatedRpc {
    pub fn new(transport: Arc<dyn RpcTransport>, identity: Identity) -> Self {
        Self {
            transport,
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Call `function` once, with the identity fields injected.
    ///
    /// Transport errors are classified before they are returned.
    pub async fn call(&self, function: &str, mut params: RpcParams) -> Result<serde_json::Value> {
        params.insert("p_app_id".into(), self.identity.app_id.clone().into());
        params.insert("p_key".into(), self.identity.key.clone().into());
        params.insert(
            "p_app_user_id".into(),
            self.identity.app_user_id.clone().into(),
        );
        params.insert(
            "p_app_user_token".into(),
            self.identity.app_user_token.clone().into(),
        );

        debug!(function = %function, "Calling remote procedure");

        self.transport
            .invoke(function, params)
            .await
            .map_err(|err| {
                warn!(
                    function = %function,
                    code = %err.code,
                    message = %err.message,
                    "Remote procedure failed"
                );
                error_classifier::classify(err)
            })
    }
}
