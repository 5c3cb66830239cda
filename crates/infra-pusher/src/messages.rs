//! Pusher protocol frames.
//!
//! Every frame is a JSON object `{"event": ..., "channel"?: ..., "data"?: ...}`.
//! Server frames carry `data` as a JSON-encoded string; client frames
//! carry it as a plain object.

use serde::Deserialize;
use serde_json::{json, Value};

pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
pub const ERROR: &str = "pusher:error";
pub const PING: &str = "pusher:ping";
pub const PONG: &str = "pusher:pong";
pub const SUBSCRIBE: &str = "pusher:subscribe";
pub const UNSUBSCRIBE: &str = "pusher:unsubscribe";
pub const SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";

/// Protocol version announced in the connection URL.
pub const PROTOCOL_VERSION: u8 = 7;

/// A frame received from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct PusherFrame {
    pub event: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl PusherFrame {
    /// Decoded payload.
    ///
    /// String data holding JSON is decoded; any other string is returned
    /// as a JSON string, and non-string data is returned unchanged.
    pub fn payload(&self) -> Value {
        match &self.data {
            Value::String(text) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            other => other.clone(),
        }
    }
}

/// Payload of `pusher:connection_established`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionEstablished {
    pub socket_id: String,
    /// Seconds of silence after which the client should ping.
    #[serde(default)]
    pub activity_timeout: Option<u64>,
}

/// Payload of `pusher:error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
}

/// Parse one server text frame.
pub fn parse_frame(text: &str) -> Result<PusherFrame, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn subscribe_frame(channel: &str) -> String {
    json!({ "event": SUBSCRIBE, "data": { "channel": channel } }).to_string()
}

pub fn unsubscribe_frame(channel: &str) -> String {
    json!({ "event": UNSUBSCRIBE, "data": { "channel": channel } }).to_string()
}

pub fn ping_frame() -> String {
    json!({ "event": PING, "data": {} }).to_string()
}

pub fn pong_frame() -> String {
    json!({ "event": PONG, "data": {} }).to_string()
}
