//! Error types for the OAuth client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur during the authorization code exchange.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The token endpoint could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The token endpoint answered with a non-success status.
    #[error("Token endpoint returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// The token endpoint answered 2xx with an unusable body.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
