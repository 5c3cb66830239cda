// Selas Infrastructure - PostgREST Adapter
// Implements: RpcTransport over HTTP (POST /rest/v1/rpc/<function>)

mod connection;
mod transport;

pub use connection::{create_http_client, PostgrestConfig, PostgrestError};
pub use transport::PostgrestTransport;
