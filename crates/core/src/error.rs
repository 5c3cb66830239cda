// Central Error Type for the SDK

use crate::port::{ChannelError, RpcError};
use thiserror::Error;

pub use crate::domain::ValidationError;

/// Why the backend refused the caller's credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFault {
    /// The backend API key itself was rejected
    InvalidApiKey,
    /// A credential parameter could not be decoded (e.g. malformed id)
    BadParameterEncoding,
}

impl std::fmt::Display for CredentialFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialFault::InvalidApiKey => {
                write!(f, "The API key is invalid. Contact the administrator.")
            }
            CredentialFault::BadParameterEncoding => write!(f, "The credentials are not correct."),
        }
    }
}

/// SDK-level error type
#[derive(Error, Debug)]
pub enum SelasError {
    #[error("Could not resolve app user: {0}")]
    AuthResolution(String),

    #[error("There is a problem with the database: {0}. Contact the administrator.")]
    Connectivity(String),

    #[error("The database cannot be reached. Contact the administrator.")]
    Unreachable,

    #[error("{0}")]
    InvalidCredentials(CredentialFault),

    #[error("{0}")]
    Domain(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(RpcError),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Subscription error: {0}")]
    Subscription(#[from] ChannelError),
}

impl SelasError {
    /// True for errors raised locally before anything was sent
    pub fn is_validation(&self) -> bool {
        matches!(self, SelasError::Validation(_))
    }
}

/// Result type alias using SelasError
pub type Result<T> = std::result::Result<T, SelasError>;
