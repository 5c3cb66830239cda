// Error Classifier
//
// Maps transport errors onto SDK error kinds. Rules are evaluated in order;
// the first match wins.

use crate::error::{CredentialFault, SelasError};
use crate::port::RpcError;

/// Postgres "invalid_text_representation"
pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Postgres "raise_exception" (RAISE in a stored procedure)
pub const RAISE_EXCEPTION: &str = "P0001";

/// Exact message returned when the backend API key is rejected
pub const INVALID_API_KEY_MESSAGE: &str = "Invalid API key";

/// Apply the known rules; `None` if none of them matched
pub fn classify_known(error: &RpcError) -> Option<SelasError> {
    if error.code.is_empty() {
        return Some(SelasError::Unreachable);
    }
    if error.message == INVALID_API_KEY_MESSAGE {
        return Some(SelasError::InvalidCredentials(CredentialFault::InvalidApiKey));
    }
    if error.code == INVALID_TEXT_REPRESENTATION {
        return Some(SelasError::InvalidCredentials(
            CredentialFault::BadParameterEncoding,
        ));
    }
    if error.code == RAISE_EXCEPTION {
        return Some(SelasError::Domain(error.message.clone()));
    }
    None
}

/// Classify any transport error. Unmatched errors are wrapped, not dropped.
pub fn classify(error: RpcError) -> SelasError {
    match classify_known(&error) {
        Some(classified) => classified,
        None => SelasError::Transport(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code_wins_over_message() {
        let err = classify(RpcError::new("", INVALID_API_KEY_MESSAGE));
        assert!(matches!(err, SelasError::Unreachable));
    }

    #[test]
    fn test_invalid_api_key() {
        let err = classify(RpcError::new("401", "Invalid API key"));
        assert!(matches!(
            err,
            SelasError::InvalidCredentials(CredentialFault::InvalidApiKey)
        ));
    }

    #[test]
    fn test_bad_parameter_encoding() {
        let err = classify(RpcError::new(
            "22P02",
            "invalid input syntax for type uuid: \"nope\"",
        ));
        assert!(matches!(
            err,
            SelasError::InvalidCredentials(CredentialFault::BadParameterEncoding)
        ));
        assert_eq!(err.to_string(), "The credentials are not correct.");
    }

    #[test]
    fn test_raised_exception_keeps_message_verbatim() {
        let err = classify(RpcError::new("P0001", "Not enough credits"));
        match err {
            SelasError::Domain(message) => assert_eq!(message, "Not enough credits"),
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_error_is_wrapped() {
        let raw = RpcError::new("PGRST202", "Could not find the function");
        assert!(classify_known(&raw).is_none());

        match classify(raw.clone()) {
            SelasError::Transport(inner) => assert_eq!(inner, raw),
            other => panic!("unexpected classification: {:?}", other),
        }
    }
}
