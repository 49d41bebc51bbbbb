//! API routes.

pub mod adapter;
pub mod auth;
pub mod event;
pub mod health;
pub mod itad;
pub mod openapi;

pub use adapter::{
    ChannelDocument, ChannelDocumentResponse, ChannelResponse, StatusResponse, UrlRequest,
    create_adapter_handler, delete_adapter_handler, get_adapter_handler, update_adapter_handler,
};
pub use auth::{
    AccessTokenResponse, RedirectQuery, RegisterTokenRequest, TokenDocument,
    TokenDocumentResponse, authorize_handler, get_token_handler, redirect_handler,
    register_token_handler,
};
pub use event::{RelayResponse, relay_event_handler};
pub use health::health_routes;
pub use itad::{
    IdsRequest, ImportResponse, LinkProfileRequest, ProfileResponse, UserResponse,
    WaitlistResponse, add_to_waitlist_handler, get_waitlist_handler,
    import_steam_wishlist_handler, link_profile_handler, remove_from_waitlist_handler,
    user_info_handler,
};

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{Result, ServerError};

/// Parse a path identifier as a UUID, before anything touches the store.
pub(crate) fn parse_identifier(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ServerError::BadRequest(format!("Invalid identifier: {}", raw)))
}

/// Parse a JSON request body, mapping every failure to a 400.
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    if body.trim().is_empty() {
        return Err(ServerError::BadRequest("Request body is missing".to_string()));
    }
    serde_json::from_str(body).map_err(|e| ServerError::BadRequest(format!("Invalid JSON: {}", e)))
}

/// Require a non-blank string field.
pub(crate) fn require_field(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::BadRequest(format!("'{}' is required", field)))
}
