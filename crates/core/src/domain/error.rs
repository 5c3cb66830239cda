// Validation Error Types
// Raised locally, before any network call.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The service {0} does not exist")]
    UnknownService(String),

    #[error("The service {service} does not have the {expected} interface (found {found})")]
    WrongInterface {
        service: String,
        expected: String,
        found: String,
    },

    #[error("The add-on {0} does not exist")]
    UnknownAddOn(String),

    #[error("The service {service} does not have the add-on {add_on}")]
    IncompatibleAddOn { add_on: String, service: String },

    #[error("The add-on {0} already exists")]
    AddOnAlreadyExists(String),

    #[error("The add-on {0} is already being created")]
    AddOnCreationInProgress(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
