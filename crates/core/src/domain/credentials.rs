// Application & User Credentials

use serde::{Deserialize, Serialize};

/// Credentials handed out to an application and one of its end users
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCredentials {
    pub app_id: String,
    pub key: String,
    pub app_user_external_id: String,
    pub app_user_token: String,
}

impl AppCredentials {
    pub fn new(
        app_id: impl Into<String>,
        key: impl Into<String>,
        app_user_external_id: impl Into<String>,
        app_user_token: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            key: key.into(),
            app_user_external_id: app_user_external_id.into(),
            app_user_token: app_user_token.into(),
        }
    }
}

// Keep secrets out of logs
impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("key", &"***")
            .field("app_user_external_id", &self.app_user_external_id)
            .field("app_user_token", &"***")
            .finish()
    }
}

/// Credentials after the external user id was resolved to an internal one.
///
/// These four values are attached to every RPC after bootstrap.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub app_id: String,
    pub key: String,
    pub app_user_id: String,
    pub app_user_token: String,
}

impl Identity {
    pub fn resolved(credentials: &AppCredentials, app_user_id: impl Into<String>) -> Self {
        Self {
            app_id: credentials.app_id.clone(),
            key: credentials.key.clone(),
            app_user_id: app_user_id.into(),
            app_user_token: credentials.app_user_token.clone(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("app_id", &self.app_id)
            .field("app_user_id", &self.app_user_id)
            .finish_non_exhaustive()
    }
}
