//! OAuth handshake and token registry endpoints.
//!
//! The PKCE verifier never touches the server's storage: `authorize` sets a
//! short-lived cookie named by the state value, and `redirect` reads it back.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use dealhook_store::TokenMap;

use super::{parse_json_body, require_field};
use crate::auth::ACCESS_TOKEN_COOKIE;
use crate::error::{ErrorResponse, Result, ServerError};
use crate::state::AppState;

/// Lifetime of the state→verifier cookie.
const PKCE_COOKIE_MAX_AGE_SECS: i64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters on the authorization server's redirect.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RedirectQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub status: u16,
    pub access_token: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterTokenRequest {
    /// External user id (e.g. a chat user id).
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// A stored token binding. The token itself is not echoed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenDocument {
    pub id: String,
    pub updated_at: DateTime<Utc>,
}

impl From<TokenMap> for TokenDocument {
    fn from(record: TokenMap) -> Self {
        Self {
            id: record.external_user_id,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenDocumentResponse {
    pub status: u16,
    pub document: TokenDocument,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/auth/authorize - Start the PKCE handshake.
#[utoipa::path(
    get,
    path = "/api/auth/authorize",
    responses(
        (status = 303, description = "Redirect to the authorization server"),
    ),
    tag = "auth"
)]
pub async fn authorize_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let (pkce, csrf_state, url) = state.oauth.begin();

    let cookie = Cookie::build((csrf_state, pkce.verifier))
        .max_age(time::Duration::seconds(PKCE_COOKIE_MAX_AGE_SECS))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();

    tracing::debug!("Issued PKCE verifier cookie");
    (jar.add(cookie), Redirect::to(&url))
}

/// GET /api/auth/redirect - Complete the handshake and exchange the code.
#[utoipa::path(
    get,
    path = "/api/auth/redirect",
    params(RedirectQuery),
    responses(
        (status = 200, description = "Token acquired", body = AccessTokenResponse),
        (status = 400, description = "Missing code/state, denied, or state mismatch", body = ErrorResponse),
        (status = 500, description = "Token endpoint unreachable or malformed", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn redirect_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RedirectQuery>,
) -> Result<(CookieJar, Json<AccessTokenResponse>)> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or(error);
        return Err(ServerError::BadRequest(format!(
            "Authorization denied: {}",
            description
        )));
    }

    let code = require_field(query.code, "code")?;
    let csrf_state = require_field(query.state, "state")?;

    let verifier = jar
        .get(&csrf_state)
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            ServerError::VerificationFailed("No verifier issued for this state".to_string())
        })?;

    let tokens = state.oauth.exchange_code(&code, &verifier).await?;
    tracing::info!("Completed authorization code exchange");

    let access_cookie = Cookie::build((ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    let jar = jar
        .remove(Cookie::build((csrf_state, "")).path("/"))
        .add(access_cookie);

    Ok((
        jar,
        Json(AccessTokenResponse {
            status: 200,
            access_token: tokens.access_token,
        }),
    ))
}

/// POST /api/auth/register - Bind a bearer token to an external user id.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterTokenRequest,
    responses(
        (status = 200, description = "Token stored", body = TokenDocumentResponse),
        (status = 400, description = "Missing id or access_token", body = ErrorResponse),
        (status = 409, description = "Token bound to another user", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register_token_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<TokenDocumentResponse>> {
    let request: RegisterTokenRequest = parse_json_body(&body)?;
    let id = require_field(request.id, "id")?;
    let token = require_field(request.access_token, "access_token")?;

    let record = state
        .store_op(move |store| store.upsert_token(&id, &token))
        .await?;
    tracing::info!(user = %record.external_user_id, "Registered token");

    Ok(Json(TokenDocumentResponse {
        status: 200,
        document: record.into(),
    }))
}

/// GET /api/auth/id/{id} - Look up the bearer token for an external user id.
#[utoipa::path(
    get,
    path = "/api/auth/id/{id}",
    params(("id" = String, Path, description = "External user id")),
    responses(
        (status = 200, description = "Token found", body = AccessTokenResponse),
        (status = 404, description = "No token for this user", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn get_token_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccessTokenResponse>> {
    let record = state.store_op(move |store| store.get_token(&id)).await?;

    Ok(Json(AccessTokenResponse {
        status: 200,
        access_token: record.bearer_token,
    }))
}
