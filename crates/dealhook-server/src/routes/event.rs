//! Inbound event relay.
//!
//! Delivery is at-most-once and best-effort: the payload is handed to a
//! detached task and the caller gets its 200 before the webhook is called.
//! Failed deliveries are logged and dropped.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use dealhook_upstream::DiscordClient;

use super::{parse_identifier, parse_json_body};
use crate::error::{ErrorResponse, Result, ServerError};
use crate::state::AppState;

/// Relay response echoing the accepted payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelayResponse {
    pub status: u16,
    /// The payload exactly as received.
    #[schema(value_type = Object)]
    pub body: serde_json::Value,
    /// Webhook the payload is being delivered to.
    pub url: String,
}

/// POST /api/event/{identifier} - Relay a JSON payload to the registered channel.
#[utoipa::path(
    post,
    path = "/api/event/{identifier}",
    params(("identifier" = String, Path, description = "Channel identifier (UUID)")),
    request_body(content = Object, description = "Arbitrary non-empty JSON payload"),
    responses(
        (status = 200, description = "Payload accepted for delivery", body = RelayResponse),
        (status = 400, description = "Malformed identifier or empty body", body = ErrorResponse),
        (status = 404, description = "No such channel", body = ErrorResponse),
    ),
    tag = "event"
)]
pub async fn relay_event_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    body: String,
) -> Result<Json<RelayResponse>> {
    let id = parse_identifier(&identifier)?;
    let record = state.store_op(move |store| store.get_channel(&id)).await?;

    let payload: serde_json::Value = parse_json_body(&body)?;
    if is_empty_payload(&payload) {
        return Err(ServerError::BadRequest("Request body is missing".to_string()));
    }

    let discord = state.upstream.discord.clone();
    let url = discord.webhook_url(&record.channel_credential, &record.channel_secret)?;

    spawn_delivery(
        discord,
        id,
        record.channel_credential,
        record.channel_secret,
        payload.clone(),
    );

    Ok(Json(RelayResponse {
        status: 200,
        body: payload,
        url: url.to_string(),
    }))
}

fn is_empty_payload(payload: &serde_json::Value) -> bool {
    match payload {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn spawn_delivery(
    discord: DiscordClient,
    identifier: Uuid,
    credential: String,
    secret: String,
    payload: serde_json::Value,
) {
    tokio::spawn(async move {
        match discord.deliver(&credential, &secret, &payload).await {
            Ok(status) => {
                tracing::debug!(identifier = %identifier, status, "Delivered event");
            }
            Err(e) => {
                tracing::warn!(
                    identifier = %identifier,
                    upstream_status = ?e.status(),
                    error = %e,
                    "Event delivery failed"
                );
            }
        }
    });
}
