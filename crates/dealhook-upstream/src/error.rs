//! Upstream error types.

use thiserror::Error;

/// Errors returned by the upstream clients.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A configured base URL or built path did not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The upstream answered 2xx with a body that could not be understood.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// The upstream HTTP status, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for upstream operations.
pub type Result<T> = std::result::Result<T, UpstreamError>;
