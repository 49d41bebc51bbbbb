//! Identifier-to-channel registration endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use dealhook_store::ChannelMap;

use super::{parse_identifier, parse_json_body, require_field};
use crate::error::{ErrorResponse, Result};
use crate::state::AppState;
use crate::webhook::parse_webhook_url;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Body for registering or re-pointing a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UrlRequest {
    /// Full webhook URL, e.g. `https://discord.com/api/webhooks/{id}/{token}`.
    #[serde(default)]
    pub url: Option<String>,
}

/// A registered channel.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChannelDocument {
    /// Generated identifier used in event callbacks.
    pub identifier: Uuid,
    pub channel_credential: String,
    pub channel_secret: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChannelMap> for ChannelDocument {
    fn from(record: ChannelMap) -> Self {
        Self {
            identifier: record.id,
            channel_credential: record.channel_credential,
            channel_secret: record.channel_secret,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Lookup response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelResponse {
    pub status: u16,
    pub data: ChannelDocument,
}

/// Create/update response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelDocumentResponse {
    pub status: u16,
    pub document: ChannelDocument,
}

/// Bare status response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: u16,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/adapter/{identifier} - Look up a registered channel.
#[utoipa::path(
    get,
    path = "/api/adapter/{identifier}",
    params(("identifier" = String, Path, description = "Channel identifier (UUID)")),
    responses(
        (status = 200, description = "Channel found", body = ChannelResponse),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "No such channel", body = ErrorResponse),
    ),
    tag = "adapter"
)]
pub async fn get_adapter_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<ChannelResponse>> {
    let id = parse_identifier(&identifier)?;
    let record = state.store_op(move |store| store.get_channel(&id)).await?;

    Ok(Json(ChannelResponse {
        status: 200,
        data: record.into(),
    }))
}

/// POST /api/adapter - Register a webhook URL under a fresh identifier.
#[utoipa::path(
    post,
    path = "/api/adapter",
    request_body = UrlRequest,
    responses(
        (status = 200, description = "Channel registered", body = ChannelDocumentResponse),
        (status = 400, description = "Missing or invalid URL", body = ErrorResponse),
        (status = 409, description = "Webhook already registered", body = ErrorResponse),
    ),
    tag = "adapter"
)]
pub async fn create_adapter_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ChannelDocumentResponse>> {
    let request: UrlRequest = parse_json_body(&body)?;
    let url = require_field(request.url, "url")?;
    let target = parse_webhook_url(&url)?;

    let record = state
        .store_op(move |store| store.create_channel(&target.credential, &target.secret))
        .await?;
    tracing::info!(identifier = %record.id, "Registered channel");

    Ok(Json(ChannelDocumentResponse {
        status: 200,
        document: record.into(),
    }))
}

/// PATCH /api/adapter/{identifier} - Point an identifier at a new webhook URL.
#[utoipa::path(
    patch,
    path = "/api/adapter/{identifier}",
    params(("identifier" = String, Path, description = "Channel identifier (UUID)")),
    request_body = UrlRequest,
    responses(
        (status = 200, description = "Channel updated", body = ChannelDocumentResponse),
        (status = 400, description = "Malformed identifier or URL", body = ErrorResponse),
        (status = 404, description = "No such channel", body = ErrorResponse),
        (status = 409, description = "Webhook already registered", body = ErrorResponse),
    ),
    tag = "adapter"
)]
pub async fn update_adapter_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    body: String,
) -> Result<Json<ChannelDocumentResponse>> {
    let id = parse_identifier(&identifier)?;
    let request: UrlRequest = parse_json_body(&body)?;
    let url = require_field(request.url, "url")?;
    let target = parse_webhook_url(&url)?;

    let record = state
        .store_op(move |store| store.update_channel(&id, &target.credential, &target.secret))
        .await?;
    tracing::info!(identifier = %record.id, "Updated channel");

    Ok(Json(ChannelDocumentResponse {
        status: 200,
        document: record.into(),
    }))
}

/// DELETE /api/adapter/{identifier} - Remove a channel.
#[utoipa::path(
    delete,
    path = "/api/adapter/{identifier}",
    params(("identifier" = String, Path, description = "Channel identifier (UUID)")),
    responses(
        (status = 200, description = "Channel removed", body = StatusResponse),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "No such channel", body = ErrorResponse),
    ),
    tag = "adapter"
)]
pub async fn delete_adapter_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<StatusResponse>> {
    let id = parse_identifier(&identifier)?;
    state.store_op(move |store| store.delete_channel(&id)).await?;
    tracing::info!(identifier = %id, "Deleted channel");

    Ok(Json(StatusResponse { status: 200 }))
}
