//! HTTP API for dealhook.
//!
//! # Features
//!
//! - Register Discord webhooks under opaque identifiers and relay events to them
//! - PKCE OAuth handshake against the price tracker, with a token registry
//! - Bearer-authenticated waitlist proxy and Steam wishlist import
//! - Request logging and OpenAPI docs at `/api/docs`
//!
//! # Example
//!
//! ```ignore
//! use dealhook_server::{AppState, Server, ServerConfig};
//!
//! let state = AppState::new(ServerConfig::new(), store, oauth, upstream);
//! Server::from_state(state).run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod webhook;

pub use auth::{AuthError, BearerToken, bearer_middleware};
pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use logging::request_logging_middleware;
pub use state::AppState;
pub use webhook::{WebhookTarget, parse_webhook_url};

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// The dealhook HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(routes::health_routes())
            .nest("/api", self.api_routes())
            .merge(routes::openapi::swagger_ui())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = cors_layer(&self.state.config.cors_origins) {
            router = router.layer(cors);
        }

        router.with_state(self.state.clone())
    }

    /// Routes under `/api`.
    fn api_routes(&self) -> Router<AppState> {
        Router::new()
            // Adapter endpoints
            .route("/adapter", post(routes::create_adapter_handler))
            .route(
                "/adapter/{identifier}",
                get(routes::get_adapter_handler)
                    .patch(routes::update_adapter_handler)
                    .delete(routes::delete_adapter_handler),
            )
            // Event relay
            .route("/event/{identifier}", post(routes::relay_event_handler))
            // OAuth handshake and token registry
            .route("/auth/authorize", get(routes::authorize_handler))
            .route("/auth/redirect", get(routes::redirect_handler))
            .route("/auth/register", post(routes::register_token_handler))
            .route("/auth/id/{id}", get(routes::get_token_handler))
            // Price tracker proxy
            .nest("/itad", self.itad_routes())
    }

    /// Price tracker proxy routes; all require a bearer credential.
    fn itad_routes(&self) -> Router<AppState> {
        Router::new()
            .route("/user", get(routes::user_info_handler))
            .route("/profile/link", put(routes::link_profile_handler))
            .route("/waitlist", get(routes::get_waitlist_handler))
            .route("/waitlist/add", put(routes::add_to_waitlist_handler))
            .route("/waitlist/remove", delete(routes::remove_from_waitlist_handler))
            .route(
                "/waitlist/steamid/{steam_id}",
                post(routes::import_steam_wishlist_handler),
            )
            .layer(middleware::from_fn(auth::bearer_middleware))
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address.
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = bind(addr).await?;
        self.serve(listener, std::future::pending()).await
    }

    /// Run until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = bind(self.state.config.bind_address).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener (useful for tests on port 0).
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();

        if let Ok(addr) = listener.local_addr() {
            info!("Starting server on {}", addr);
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))
}

/// `*` allows any origin; an empty list disables CORS.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return Some(layer.allow_origin(Any));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(layer.allow_origin(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use dealhook_oauth::{OAuthClient, OAuthConfig};
    use dealhook_store::Store;
    use dealhook_upstream::{UpstreamClients, UpstreamConfig};
    use tower::ServiceExt;

    fn test_state(upstream_url: &str) -> AppState {
        let oauth = OAuthClient::new(OAuthConfig::new(
            "test-client",
            format!("{}/oauth/authorize/", upstream_url),
            format!("{}/oauth/token/", upstream_url),
            "http://localhost:3000/api/auth/redirect",
            &["wait_read".to_string()],
        ))
        .unwrap();
        let upstream = UpstreamClients::new(&UpstreamConfig {
            itad_api_url: upstream_url.to_string(),
            steam_api_url: upstream_url.to_string(),
            discord_api_url: upstream_url.to_string(),
            ..Default::default()
        })
        .unwrap();

        AppState::new(
            ServerConfig::new(),
            Arc::new(Store::open_in_memory().unwrap()),
            oauth,
            upstream,
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn router() -> Router {
        Server::from_state(test_state("http://127.0.0.1:9")).router()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_adapter_lifecycle() {
        let app = router();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/adapter")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"url":"https://discord.com/api/webhooks/123/abc"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        let identifier = created["document"]["identifier"].as_str().unwrap().to_string();
        assert_eq!(created["document"]["channel_credential"], "123");
        assert_eq!(created["document"]["channel_secret"], "abc");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/adapter/{}", identifier))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["identifier"], identifier);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/adapter/{}", identifier))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/adapter/{}", identifier))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "not_found");
    }

    async fn adapter_request(app: Router, method: &str, identifier: &str) -> axum::response::Response {
        let body = if method == "PATCH" {
            Body::from(r#"{"url":"https://discord.com/api/webhooks/9/new"}"#)
        } else {
            Body::empty()
        };
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(format!("/api/adapter/{}", identifier))
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_malformed_identifier_is_bad_request() {
        for method in ["GET", "PATCH", "DELETE"] {
            let response = adapter_request(router(), method, "not-a-uuid").await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", method);
            assert_eq!(body_json(response).await["code"], "bad_request", "{}", method);
        }
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_not_found() {
        let app = router();
        let unknown = uuid::Uuid::new_v4().to_string();

        for method in ["GET", "PATCH", "DELETE"] {
            let response = adapter_request(app.clone(), method, &unknown).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", method);
            assert_eq!(body_json(response).await["code"], "not_found", "{}", method);
        }
    }

    #[tokio::test]
    async fn test_itad_routes_require_bearer() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/itad/waitlist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "unauthorized");
    }

    #[tokio::test]
    async fn test_authorize_sets_verifier_cookie() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/authorize")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.contains("code_challenge_method=S256"));
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=300"));
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_cors_layer() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["*".to_string()]).is_some());
        assert!(cors_layer(&["http://localhost:5173".to_string()]).is_some());
    }
}
