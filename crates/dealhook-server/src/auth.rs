//! Bearer credential middleware for the price tracker proxy routes.
//!
//! The token is read from `Authorization: Bearer <token>`, falling back to the
//! `access_token` cookie set by the OAuth callback. It is not validated here;
//! the price tracker decides whether it is still good.

use axum::{
    extract::Request,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::ServerError;

/// Cookie carrying the bearer token after a completed OAuth handshake.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

// ─────────────────────────────────────────────────────────────────────────────
// Bearer token
// ─────────────────────────────────────────────────────────────────────────────

/// Caller's bearer token, inserted into request extensions by [`bearer_middleware`].
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Error
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Neither header nor cookie present.
    MissingToken,
    /// Authorization header present but not `Bearer <token>`.
    InvalidFormat,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing authorization token"),
            AuthError::InvalidFormat => write!(f, "Invalid authorization format"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServerError::Unauthorized(self.to_string()).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Reject requests without a bearer credential before any upstream call.
pub async fn bearer_middleware(mut request: Request, next: Next) -> Result<Response, AuthError> {
    let token = extract_bearer(request.headers())?;
    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}

/// Pull the bearer token from the headers. The Authorization header wins over the cookie.
pub fn extract_bearer(headers: &HeaderMap) -> Result<BearerToken, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidFormat)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidFormat)?;
        return Ok(BearerToken(token.to_string()));
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
        .map(BearerToken)
        .ok_or(AuthError::MissingToken)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
