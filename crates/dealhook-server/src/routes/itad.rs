//! Price tracker proxy: user info, profile links, waitlist read/write and
//! Steam wishlist import.
//!
//! Every handler here runs behind [`crate::auth::bearer_middleware`].

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::adapter::StatusResponse;
use super::parse_json_body;
use crate::auth::BearerToken;
use crate::error::{ErrorResponse, Result, ServerError};
use crate::state::AppState;

/// Length of a SteamID64.
const STEAM_ID_LEN: usize = 17;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct IdsRequest {
    /// Price tracker game ids.
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WaitlistResponse {
    pub status: u16,
    #[schema(value_type = Object)]
    pub waitlist: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub status: u16,
    #[schema(value_type = Object)]
    pub user: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct LinkProfileRequest {
    /// Identifier of the external account to link.
    #[serde(default, rename = "accountId")]
    pub account_id: Option<String>,
    /// Display name shown on the price tracker profile.
    #[serde(default, rename = "accountName")]
    pub account_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub status: u16,
    #[schema(value_type = Object)]
    pub profile: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    pub status: u16,
    pub message: String,
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn require_ids(body: &str) -> Result<Vec<String>> {
    let request: IdsRequest = parse_json_body(body)?;
    request
        .ids
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Game ID(s) is missing".to_string()))
}

fn require_link(body: &str) -> Result<(String, String)> {
    let request: LinkProfileRequest = parse_json_body(body)?;
    let non_empty = |value: Option<String>, field: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ServerError::BadRequest(format!("{field} is missing")))
    };
    Ok((
        non_empty(request.account_id, "accountId")?,
        non_empty(request.account_name, "accountName")?,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/itad/user - Authorized user's profile.
#[utoipa::path(
    get,
    path = "/api/itad/user",
    responses(
        (status = 200, description = "Upstream status and body", body = UserResponse),
        (status = 401, description = "No bearer credential", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "itad"
)]
pub async fn user_info_handler(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let response = state.upstream.itad.user_info(token.as_str()).await?;

    Ok((
        status_code(response.status),
        Json(UserResponse {
            status: response.status,
            user: response.body,
        }),
    ))
}

/// PUT /api/itad/profile/link - Link an external account to the user's profile.
#[utoipa::path(
    put,
    path = "/api/itad/profile/link",
    request_body = LinkProfileRequest,
    responses(
        (status = 200, description = "Upstream status and body", body = ProfileResponse),
        (status = 400, description = "Missing accountId or accountName", body = ErrorResponse),
        (status = 401, description = "No bearer credential", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "itad"
)]
pub async fn link_profile_handler(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    body: String,
) -> Result<(StatusCode, Json<ProfileResponse>)> {
    let (account_id, account_name) = require_link(&body)?;
    let response = state
        .upstream
        .itad
        .link_profile(token.as_str(), &account_id, &account_name)
        .await?;
    tracing::info!(status = response.status, "Linked profile account");

    Ok((
        status_code(response.status),
        Json(ProfileResponse {
            status: response.status,
            profile: response.body,
        }),
    ))
}

/// GET /api/itad/waitlist - The user's waitlist, mirrored from upstream.
#[utoipa::path(
    get,
    path = "/api/itad/waitlist",
    responses(
        (status = 200, description = "Upstream status and body", body = WaitlistResponse),
        (status = 401, description = "No bearer credential", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "itad"
)]
pub async fn get_waitlist_handler(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
) -> Result<(StatusCode, Json<WaitlistResponse>)> {
    let response = state.upstream.itad.waitlist(token.as_str()).await?;

    Ok((
        status_code(response.status),
        Json(WaitlistResponse {
            status: response.status,
            waitlist: response.body,
        }),
    ))
}

/// PUT /api/itad/waitlist/add - Add games to the waitlist.
#[utoipa::path(
    put,
    path = "/api/itad/waitlist/add",
    request_body = IdsRequest,
    responses(
        (status = 200, description = "Upstream status", body = StatusResponse),
        (status = 400, description = "Missing or empty id list", body = ErrorResponse),
        (status = 401, description = "No bearer credential", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "itad"
)]
pub async fn add_to_waitlist_handler(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    body: String,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let ids = require_ids(&body)?;
    let status = state
        .upstream
        .itad
        .add_to_waitlist(token.as_str(), &ids)
        .await?;
    tracing::info!(count = ids.len(), status, "Added games to waitlist");

    Ok((status_code(status), Json(StatusResponse { status })))
}

/// DELETE /api/itad/waitlist/remove - Remove games from the waitlist.
#[utoipa::path(
    delete,
    path = "/api/itad/waitlist/remove",
    request_body = IdsRequest,
    responses(
        (status = 200, description = "Upstream status", body = StatusResponse),
        (status = 400, description = "Missing or empty id list", body = ErrorResponse),
        (status = 401, description = "No bearer credential", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "itad"
)]
pub async fn remove_from_waitlist_handler(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    body: String,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let ids = require_ids(&body)?;
    let status = state
        .upstream
        .itad
        .remove_from_waitlist(token.as_str(), &ids)
        .await?;
    tracing::info!(count = ids.len(), status, "Removed games from waitlist");

    Ok((status_code(status), Json(StatusResponse { status })))
}

/// POST /api/itad/waitlist/steamid/{steam_id} - Import a public Steam wishlist.
#[utoipa::path(
    post,
    path = "/api/itad/waitlist/steamid/{steam_id}",
    params(("steam_id" = String, Path, description = "17-digit SteamID64")),
    responses(
        (status = 200, description = "Games added", body = ImportResponse),
        (status = 400, description = "Bad SteamID or private profile/wishlist", body = ErrorResponse),
        (status = 401, description = "No bearer credential", body = ErrorResponse),
        (status = 404, description = "No wishlist game is known to the price tracker", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "itad"
)]
pub async fn import_steam_wishlist_handler(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Path(steam_id): Path<String>,
) -> Result<Json<ImportResponse>> {
    if !is_steam_id(&steam_id) {
        return Err(ServerError::BadRequest(format!(
            "Invalid SteamID64: {}",
            steam_id
        )));
    }

    let steam = &state.upstream.steam;
    if steam.has_api_key() && !steam.is_profile_public(&steam_id).await? {
        return Err(ServerError::BadRequest(
            "Steam profile is not public".to_string(),
        ));
    }

    let app_ids = steam.wishlist(&steam_id).await?.ok_or_else(|| {
        ServerError::BadRequest(
            "Steam wishlist is not public; make sure the wishlist is visible".to_string(),
        )
    })?;

    let lookup = state.upstream.itad.lookup_steam_apps(&app_ids).await?;
    if lookup.ids.is_empty() {
        return Err(ServerError::NotFound(
            "No wishlist games matched the price tracker catalogue".to_string(),
        ));
    }

    let status = state
        .upstream
        .itad
        .add_to_waitlist(token.as_str(), &lookup.ids)
        .await?;
    if !(200..300).contains(&status) {
        return Err(ServerError::Upstream {
            status: Some(status),
            message: "Waitlist update rejected".to_string(),
        });
    }

    tracing::info!(
        added = lookup.ids.len(),
        unmatched = lookup.unmatched,
        "Imported Steam wishlist"
    );

    Ok(Json(ImportResponse {
        status: 200,
        message: format!(
            "Added {} game(s) to the waitlist ({} unmatched)",
            lookup.ids.len(),
            lookup.unmatched
        ),
    }))
}

fn is_steam_id(raw: &str) -> bool {
    raw.len() == STEAM_ID_LEN && raw.bytes().all(|b| b.is_ascii_digit())
}
