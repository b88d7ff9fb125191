//! Error types for the upstream clients

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the CI or source-control server
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure before a response arrived
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response arrived but could not be understood
    #[error("Failed to parse response: {0}")]
    Protocol(String),

    /// Server answered with a status the operation does not accept
    #[error("{operation} failed (status {status}): {message}")]
    Remote {
        /// Operation that was attempted
        operation: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// A URL could not be built from the configured base
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Create a remote error from an operation, status code and body
    pub fn remote(operation: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            operation,
            status,
            message: message.into(),
        }
    }

    /// Status code of a remote error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
