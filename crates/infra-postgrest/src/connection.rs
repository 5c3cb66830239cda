// HTTP Client Setup

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout (the SDK itself never times out)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to reach the backend
#[derive(Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://<project>.supabase.co`
    pub base_url: String,
    /// Public (anon) API key sent with every request
    pub api_key: String,
    pub request_timeout: Duration,
}

impl PostgrestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for PostgrestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Transport setup errors
#[derive(Error, Debug)]
pub enum PostgrestError {
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Create an HTTP client carrying the API key headers
pub fn create_http_client(config: &PostgrestConfig) -> Result<reqwest::Client, PostgrestError> {
    let mut headers = HeaderMap::new();

    let api_key = HeaderValue::from_str(&config.api_key)
        .map_err(|e| PostgrestError::InvalidHeader(format!("apikey: {}", e)))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .map_err(|e| PostgrestError::InvalidHeader(format!("authorization: {}", e)))?;

    headers.insert("apikey", api_key);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout)
        .build()?;

    Ok(client)
}
