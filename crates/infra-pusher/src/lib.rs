// Selas Infrastructure - Pusher Adapter
// Implements: ResultChannel (Pusher protocol 7 over WebSocket)

mod channel;
pub mod messages;

pub use channel::{PusherChannel, PusherConfig, DEFAULT_CLUSTER};
