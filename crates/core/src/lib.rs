// Selas Core - Domain Types, Ports & Request Pipeline
// NO infrastructure dependencies (Hexagonal Architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::SelasService;
pub use error::{CredentialFault, Result, SelasError, ValidationError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
