// PostgREST RpcTransport Implementation

use crate::connection::{create_http_client, PostgrestConfig, PostgrestError};
use async_trait::async_trait;
use reqwest::StatusCode;
use selas_core::port::{RpcError, RpcParams, RpcTransport};
use tracing::{debug, trace};

// Failures below HTTP (connect, TLS, timeout, body read) carry an empty
// code, the same as a failed fetch in the official clients.
fn map_reqwest_error(err: reqwest::Error) -> RpcError {
    if err.is_timeout() {
        RpcError::unreachable(format!("Request timed out: {}", err))
    } else if err.is_connect() {
        RpcError::unreachable(format!("Connection failed: {}", err))
    } else {
        RpcError::unreachable(err.to_string())
    }
}

/// Decode a 2xx body. Procedures returning `void` answer with an empty body.
pub(crate) fn parse_success_body(body: &str) -> Result<serde_json::Value, RpcError> {
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| RpcError::unreachable(format!("Invalid response body: {}", e)))
}

/// Decode a non-2xx body into a structured error.
///
/// Bodies without a `code` (e.g. gateway errors) get the HTTP status as code.
pub(crate) fn parse_error_body(status: StatusCode, body: &str) -> RpcError {
    let status_code = status.as_u16().to_string();

    match serde_json::from_str::<RpcError>(body) {
        Ok(mut err) => {
            if err.code.is_empty() {
                err.code = status_code;
            }
            if err.message.is_empty() {
                err.message = status.canonical_reason().unwrap_or("").to_string();
            }
            err
        }
        Err(_) => {
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                body.trim().to_string()
            };
            RpcError::new(status_code, message)
        }
    }
}

pub struct PostgrestTransport {
    client: reqwest::Client,
    rpc_url: String,
}

impl PostgrestTransport {
    pub fn new(config: &PostgrestConfig) -> Result<Self, PostgrestError> {
        let client = create_http_client(config)?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Reuse an existing client (it must already carry the API key headers)
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            rpc_url: format!("{}/rest/v1/rpc", base_url.trim_end_matches('/')),
        }
    }

    pub fn function_url(&self, function: &str) -> String {
        format!("{}/{}", self.rpc_url, function)
    }
}

#[async_trait]
impl RpcTransport for PostgrestTransport {
    async fn invoke(
        &self,
        function: &str,
        params: RpcParams,
    ) -> Result<serde_json::Value, RpcError> {
        let url = self.function_url(function);

        let response = self
            .client
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        debug!(function = %function, status = status.as_u16(), "RPC response");
        trace!(function = %function, body = %body, "RPC response body");

        if status.is_success() {
            parse_success_body(&body)
        } else {
            Err(parse_error_body(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_function_url() {
        let transport =
            PostgrestTransport::with_client(reqwest::Client::new(), "https://example.supabase.co/");
        assert_eq!(
            transport.function_url("post_job"),
            "https://example.supabase.co/rest/v1/rpc/post_job"
        );
    }

    #[test]
    fn test_empty_success_body_is_null() {
        assert_eq!(parse_success_body("").unwrap(), json!(null));
        assert_eq!(parse_success_body("\"check\"").unwrap(), json!("check"));
        assert_eq!(parse_success_body("[1,2]").unwrap(), json!([1, 2]));
        assert_eq!(parse_success_body("<html>").unwrap_err().code, "");
    }

    #[test]
    fn test_postgres_error_body() {
        let err = parse_error_body(
            StatusCode::BAD_REQUEST,
            r#"{"code":"P0001","details":null,"hint":null,"message":"Not enough credits"}"#,
        );
        assert_eq!(err.code, "P0001");
        assert_eq!(err.message, "Not enough credits");
        assert_eq!(err.details, None);
    }

    #[test]
    fn test_gateway_error_without_code_uses_status() {
        let err = parse_error_body(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Invalid API key","hint":"Double check your Supabase `anon` or `service_role` API key."}"#,
        );
        assert_eq!(err.code, "401");
        assert_eq!(err.message, "Invalid API key");
        assert!(err.hint.is_some());
    }

    #[test]
    fn test_non_json_error_body() {
        let err = parse_error_body(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.code, "502");
        assert_eq!(err.message, "upstream down");

        let err = parse_error_body(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.message, "Service Unavailable");
    }
}
