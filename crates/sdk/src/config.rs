//! Client configuration
//!
//! Everything the client needs to reach the backend is injected here,
//! either directly or from `SELAS_*` environment variables.

use crate::error::{Result, SdkError};
use selas_core::domain::{AppCredentials, WorkerFilter};
use selas_infra_postgrest::PostgrestConfig;
use selas_infra_pusher::{PusherConfig, DEFAULT_CLUSTER};
use std::time::Duration;

pub const ENV_BACKEND_URL: &str = "SELAS_BACKEND_URL";
pub const ENV_BACKEND_KEY: &str = "SELAS_BACKEND_KEY";
pub const ENV_PUSHER_KEY: &str = "SELAS_PUSHER_KEY";
pub const ENV_PUSHER_CLUSTER: &str = "SELAS_PUSHER_CLUSTER";
pub const ENV_PUSHER_HOST: &str = "SELAS_PUSHER_HOST";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SELAS_REQUEST_TIMEOUT_SECS";
pub const ENV_WORKER_BRANCH: &str = "SELAS_WORKER_BRANCH";

pub const ENV_APP_ID: &str = "SELAS_APP_ID";
pub const ENV_APP_KEY: &str = "SELAS_APP_KEY";
pub const ENV_APP_USER_EXTERNAL_ID: &str = "SELAS_APP_USER_EXTERNAL_ID";
pub const ENV_APP_USER_TOKEN: &str = "SELAS_APP_USER_TOKEN";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Backend and pub/sub endpoints
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend project URL
    pub backend_url: String,
    /// Public backend API key
    pub backend_api_key: String,
    /// Public Pusher application key
    pub pusher_app_key: String,
    pub pusher_cluster: String,
    /// WebSocket base URL overriding the cluster host
    pub pusher_host: Option<String>,
    pub request_timeout: Duration,
    /// Applied to every submission and worker count
    pub worker_filter: WorkerFilter,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("backend_url", &self.backend_url)
            .field("backend_api_key", &"***")
            .field("pusher_app_key", &self.pusher_app_key)
            .field("pusher_cluster", &self.pusher_cluster)
            .field("pusher_host", &self.pusher_host)
            .field("request_timeout", &self.request_timeout)
            .field("worker_filter", &self.worker_filter)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(
        backend_url: impl Into<String>,
        backend_api_key: impl Into<String>,
        pusher_app_key: impl Into<String>,
    ) -> Self {
        Self {
            backend_url: backend_url.into(),
            backend_api_key: backend_api_key.into(),
            pusher_app_key: pusher_app_key.into(),
            pusher_cluster: DEFAULT_CLUSTER.to_string(),
            pusher_host: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            worker_filter: WorkerFilter::production(),
        }
    }

    /// Load from `SELAS_*` environment variables
    ///
    /// # Errors
    /// `SdkError::Config` when a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new(
            required(&lookup, ENV_BACKEND_URL)?,
            required(&lookup, ENV_BACKEND_KEY)?,
            required(&lookup, ENV_PUSHER_KEY)?,
        );

        if let Some(cluster) = lookup(ENV_PUSHER_CLUSTER) {
            config.pusher_cluster = cluster;
        }
        config.pusher_host = lookup(ENV_PUSHER_HOST);

        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                SdkError::Config(format!("{} must be a number of seconds", ENV_REQUEST_TIMEOUT_SECS))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(branch) = lookup(ENV_WORKER_BRANCH) {
            config.worker_filter = WorkerFilter::branch(branch);
        }

        Ok(config)
    }

    pub fn with_worker_filter(mut self, worker_filter: WorkerFilter) -> Self {
        self.worker_filter = worker_filter;
        self
    }

    pub fn postgrest(&self) -> PostgrestConfig {
        PostgrestConfig {
            base_url: self.backend_url.clone(),
            api_key: self.backend_api_key.clone(),
            request_timeout: self.request_timeout,
        }
    }

    pub fn pusher(&self) -> PusherConfig {
        let config = PusherConfig::new(self.pusher_app_key.clone())
            .with_cluster(self.pusher_cluster.clone());
        match &self.pusher_host {
            Some(host) => config.with_host(host.clone()),
            None => config,
        }
    }
}

/// Load application credentials from `SELAS_APP_*` environment variables
pub fn credentials_from_env() -> Result<AppCredentials> {
    credentials_from_lookup(|name| std::env::var(name).ok())
}

pub(crate) fn credentials_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppCredentials> {
    Ok(AppCredentials::new(
        required(&lookup, ENV_APP_ID)?,
        required(&lookup, ENV_APP_KEY)?,
        required(&lookup, ENV_APP_USER_EXTERNAL_ID)?,
        required(&lookup, ENV_APP_USER_TOKEN)?,
    ))
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SdkError::Config(format!("{} is not set", name)))
}
