//! Error types for IONOS DNS synchronisation
//!
//! Only faults live here. Expected results of a convergence call
//! (including `Unauthorized`, `NotFound` and `Conflict`) are returned as
//! [`OperationOutcome`](crate::OperationOutcome) values instead.

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the sync engine
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent or its response could not be read
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with a status the engine cannot classify
    #[error("Provider API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code returned by the provider
        status: u16,
        /// Decoded error list or raw response body
        message: String,
    },

    /// Success status, but the body did not have the expected shape
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a provider API fault
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// HTTP status carried by an API fault, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_fault_carries_status_and_body() {
        let err = Error::api(500, "boom");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Provider API error (HTTP 500): boom");
    }

    #[test]
    fn test_non_api_errors_have_no_status() {
        assert_eq!(Error::transport("refused").status(), None);
        assert_eq!(Error::invalid_response("truncated").status(), None);
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: Error = anyhow::anyhow!("context lost").into();
        assert!(matches!(err, Error::Other(ref m) if m == "context lost"));
    }
}
