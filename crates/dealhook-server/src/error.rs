//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use dealhook_oauth::OAuthError;
use dealhook_store::StoreError;
use dealhook_upstream::UpstreamError;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The OAuth callback state has no matching verifier.
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Missing or malformed bearer credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A third-party API failed. `status` is set when the upstream answered.
    #[error("Upstream error: {message}")]
    Upstream { status: Option<u16>, message: String },

    /// Database/storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::VerificationFailed(_) => (StatusCode::BAD_REQUEST, "verification_failed"),
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ServerError::Upstream { status, .. } => {
                let status = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, "upstream_error")
            }
            ServerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ServerError::NotFound(what),
            StoreError::Conflict(what) => ServerError::Conflict(format!("{} already exists", what)),
            StoreError::Database(e) => ServerError::Storage(e.to_string()),
            StoreError::Migration(msg) => ServerError::Internal(format!("Migration error: {}", msg)),
        }
    }
}

impl From<UpstreamError> for ServerError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status, message } => ServerError::Upstream {
                status: Some(status),
                message,
            },
            other => ServerError::Upstream {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

impl From<OAuthError> for ServerError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::Backend { status, message } => ServerError::Upstream {
                status: Some(status),
                message,
            },
            OAuthError::Config(msg) => ServerError::Config(msg),
            other => ServerError::Upstream {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: u16,
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
