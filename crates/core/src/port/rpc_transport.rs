// RPC Transport Port (Interface)
// "Invoke a named remote procedure with a parameter bag"

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named parameters of one remote call
pub type RpcParams = serde_json::Map<String, serde_json::Value>;

/// Structured error returned by the remote side (or synthesized by the
/// transport when the remote side could not be reached, with an empty code)
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct RpcError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl RpcError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// Failure below the remote procedure (network, DNS, TLS, bad body)
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new("", message)
    }
}

/// Transport used by every remote call
///
/// Implementations:
/// - PostgrestTransport: HTTP POST to `/rest/v1/rpc/<function>`
/// - MockRpcTransport: scripted responses for tests
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invoke `function` once with `params`
    ///
    /// Returns the raw result payload (`Null` when the procedure returns
    /// nothing). Never retries.
    async fn invoke(
        &self,
        function: &str,
        params: RpcParams,
    ) -> Result<serde_json::Value, RpcError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// A recorded call
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub function: String,
        pub params: RpcParams,
    }

    /// Mock RPC transport with one sticky response per function
    #[derive(Clone, Default)]
    pub struct MockRpcTransport {
        responses: Arc<Mutex<HashMap<String, Result<serde_json::Value, RpcError>>>>,
        calls: Arc<Mutex<Vec<RecordedCall>>>,
    }

    impl MockRpcTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer every call to `function` with `value`
        pub fn on(&self, function: impl Into<String>, value: serde_json::Value) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .insert(function.into(), Ok(value));
            self
        }

        /// Fail every call to `function` with `error`
        pub fn on_error(&self, function: impl Into<String>, error: RpcError) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .insert(function.into(), Err(error));
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_to(&self, function: &str) -> Vec<RecordedCall> {
            self.calls()
                .into_iter()
                .filter(|call| call.function == function)
                .collect()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn was_called(&self, function: &str) -> bool {
            !self.calls_to(function).is_empty()
        }
    }

    #[async_trait]
    impl RpcTransport for MockRpcTransport {
        async fn invoke(
            &self,
            function: &str,
            params: RpcParams,
        ) -> Result<serde_json::Value, RpcError> {
            self.calls.lock().unwrap().push(RecordedCall {
                function: function.to_string(),
                params,
            });

            self.responses
                .lock()
                .unwrap()
                .get(function)
                .cloned()
                .unwrap_or_else(|| {
                    Err(RpcError::new(
                        "PGRST202",
                        format!("Could not find the function public.{}", function),
                    ))
                })
        }
    }
}
