//! REST client error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for REST client operations.
pub type Result<T> = std::result::Result<T, RestClientError>;

/// REST client errors.
#[derive(Debug, Error)]
pub enum RestClientError {
    /// A required builder field was not set, or a setting is invalid.
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// The remote service answered with a non-2xx status.
    ///
    /// Produced by the [`ErrorDecoder`](crate::ErrorDecoder); the message
    /// embeds the response body verbatim when one was read.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Diagnostic message.
        message: String,
    },

    /// The command did not complete within its timeout.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// Circuit breaker is open, request short-circuited.
    #[error("Circuit breaker is open, request short-circuited")]
    CircuitOpen,

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request building error.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// Request body could not be encoded.
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// Response body could not be decoded.
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl RestClientError {
    /// Create a status error.
    pub fn status_error(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code if the remote service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect())
    }

    /// Check if the request was short-circuited by an open breaker.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen)
    }
}
