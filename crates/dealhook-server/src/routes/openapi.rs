//! OpenAPI documentation configuration.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::{adapter, auth, event, health, itad};
use crate::error::ErrorResponse;

/// OpenAPI documentation for the dealhook API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "dealhook API",
        description = "Webhook relay and price tracker waitlist proxy",
        version = "1.0.0",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Local server"),
    ),
    paths(
        health::health,
        // Adapter
        adapter::get_adapter_handler,
        adapter::create_adapter_handler,
        adapter::update_adapter_handler,
        adapter::delete_adapter_handler,
        // Event
        event::relay_event_handler,
        // Auth
        auth::authorize_handler,
        auth::redirect_handler,
        auth::register_token_handler,
        auth::get_token_handler,
        // Price tracker
        itad::user_info_handler,
        itad::link_profile_handler,
        itad::get_waitlist_handler,
        itad::add_to_waitlist_handler,
        itad::remove_from_waitlist_handler,
        itad::import_steam_wishlist_handler,
    ),
    components(
        schemas(
            ErrorResponse,
            health::HealthResponse,
            adapter::UrlRequest,
            adapter::ChannelDocument,
            adapter::ChannelResponse,
            adapter::ChannelDocumentResponse,
            adapter::StatusResponse,
            event::RelayResponse,
            auth::AccessTokenResponse,
            auth::RegisterTokenRequest,
            auth::TokenDocument,
            auth::TokenDocumentResponse,
            itad::IdsRequest,
            itad::WaitlistResponse,
            itad::UserResponse,
            itad::LinkProfileRequest,
            itad::ProfileResponse,
            itad::ImportResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "adapter", description = "Webhook channel registration"),
        (name = "event", description = "Event relay"),
        (name = "auth", description = "OAuth handshake and token registry"),
        (name = "itad", description = "Price tracker user, profile and waitlist proxy"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}

/// Swagger UI at `/api/docs`, serving the document at `/api/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi())
}
