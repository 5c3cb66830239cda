//! SDK Error Types

use selas_core::SelasError;
use selas_infra_postgrest::PostgrestError;
use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Adapters could not be built
    #[error("Setup error: {0}")]
    Setup(String),

    #[error(transparent)]
    Client(#[from] SelasError),
}

impl From<PostgrestError> for SdkError {
    fn from(e: PostgrestError) -> Self {
        SdkError::Setup(e.to_string())
    }
}

impl SdkError {
    /// The underlying client error, if any
    pub fn as_client_error(&self) -> Option<&SelasError> {
        match self {
            SdkError::Client(e) => Some(e),
            _ => None,
        }
    }
}
