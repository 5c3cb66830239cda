// Result Channel Port (Interface)
// Publish/subscribe connection delivering job results

use crate::domain::JobResult;
use async_trait::async_trait;
use thiserror::Error;

/// Callback invoked with a pushed result, at most once
pub type ResultCallback = Box<dyn FnOnce(JobResult) + Send + 'static>;

/// Pub/sub errors
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection closed")]
    Closed,
}

/// Result channel trait
///
/// Implementations:
/// - PusherChannel: Pusher protocol over WebSocket
/// - MockResultChannel: in-memory, events are published by the test
#[async_trait]
pub trait ResultChannel: Send + Sync {
    /// Subscribe to `channel` and register `callback` for `event`
    ///
    /// # Errors
    /// - ChannelError::Connection if the provider cannot be reached
    async fn bind(
        &self,
        channel: &str,
        event: &str,
        callback: ResultCallback,
    ) -> Result<(), ChannelError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Binding {
        channel: String,
        event: String,
        callback: ResultCallback,
    }

    /// Mock result channel
    #[derive(Clone, Default)]
    pub struct MockResultChannel {
        bindings: Arc<Mutex<Vec<Binding>>>,
    }

    impl MockResultChannel {
        pub fn new() -> Self {
            Self::default()
        }

        /// (channel, event) pairs currently bound
        pub fn bindings(&self) -> Vec<(String, String)> {
            self.bindings
                .lock()
                .unwrap()
                .iter()
                .map(|binding| (binding.channel.clone(), binding.event.clone()))
                .collect()
        }

        /// Deliver `payload` to every callback bound to (channel, event).
        ///
        /// Callbacks are consumed; returns how many were invoked.
        pub fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) -> usize {
            let matching: Vec<Binding> = {
                let mut bindings = self.bindings.lock().unwrap();
                let (matching, rest): (Vec<Binding>, Vec<Binding>) = bindings
                    .drain(..)
                    .partition(|b| b.channel == channel && b.event == event);
                *bindings = rest;
                matching
            };

            let delivered = matching.len();
            for binding in matching {
                (binding.callback)(JobResult::new(payload.clone()));
            }
            delivered
        }
    }

    #[async_trait]
    impl ResultChannel for MockResultChannel {
        async fn bind(
            &self,
            channel: &str,
            event: &str,
            callback: ResultCallback,
        ) -> Result<(), ChannelError> {
            self.bindings.lock().unwrap().push(Binding {
                channel: channel.to_string(),
                event: event.to_string(),
                callback,
            });
            Ok(())
        }
    }
}
