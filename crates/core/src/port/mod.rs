// Port Layer - Interfaces for external collaborators

pub mod result_channel;
pub mod rpc_transport;

// Re-exports
pub use result_channel::{ChannelError, ResultCallback, ResultChannel};
pub use rpc_transport::{RpcError, RpcParams, RpcTransport};
