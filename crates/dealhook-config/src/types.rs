//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]     # bind address, port, request logging, CORS
//! [store]      # SQLite database path
//! [oauth]      # price tracker OAuth client
//! [upstream]   # price tracker / Steam / Discord API endpoints and keys
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default port, matching the port the webhook callbacks are usually registered against.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default REST body limit (1 MB). Event payloads are small JSON documents.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default timeout for outbound HTTP calls.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. Use the accessor methods to read a
/// section with defaults filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DealhookConfig {
    /// HTTP server settings.
    pub server: Option<ServerSection>,

    /// Record store settings.
    pub store: Option<StoreSection>,

    /// OAuth client settings for the price tracker.
    pub oauth: Option<OAuthSection>,

    /// Third-party API endpoints and keys.
    pub upstream: Option<UpstreamSection>,
}

impl DealhookConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced wholesale, not merged field by field.
    pub fn merge(&mut self, other: DealhookConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.store.is_some() {
            self.store = other.store;
        }
        if other.oauth.is_some() {
            self.oauth = other.oauth;
        }
        if other.upstream.is_some() {
            self.upstream = other.upstream;
        }
    }

    /// Server section with defaults applied.
    pub fn server(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    /// Store section with defaults applied.
    pub fn store(&self) -> StoreSection {
        self.store.clone().unwrap_or_default()
    }

    /// OAuth section with defaults applied.
    pub fn oauth(&self) -> OAuthSection {
        self.oauth.clone().unwrap_or_default()
    }

    /// Upstream section with defaults applied.
    pub fn upstream(&self) -> UpstreamSection {
        self.upstream.clone().unwrap_or_default()
    }

    /// Whether any API key is stored in plaintext in this config.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.upstream
            .as_ref()
            .is_some_and(|u| u.itad_api_key.is_some() || u.steam_api_key.is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable request logging.
    pub request_logging: bool,
    /// CORS allowed origins. `["*"]` allows any origin; empty disables CORS.
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            request_logging: true,
            cors_origins: vec!["*".to_string()],
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// SQLite database file. Relative paths resolve under the config directory.
    pub database: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            database: PathBuf::from("dealhook.db"),
        }
    }
}

impl StoreSection {
    /// Resolve the database path against `base` when it is relative.
    pub fn resolve_database(&self, base: &Path) -> PathBuf {
        if self.database.is_relative() {
            base.join(&self.database)
        } else {
            self.database.clone()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OAuth
// ─────────────────────────────────────────────────────────────────────────────

/// `[oauth]` section for the price tracker's authorization server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSection {
    /// Registered OAuth client id. Required to start the server.
    pub client_id: Option<String>,
    /// Redirect URL registered with the authorization server.
    pub redirect_url: String,
    /// Authorization endpoint.
    pub authorize_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,
}

impl Default for OAuthSection {
    fn default() -> Self {
        Self {
            client_id: None,
            redirect_url: format!("http://localhost:{}/api/auth/redirect", DEFAULT_PORT),
            authorize_url: "https://isthereanydeal.com/oauth/authorize/".to_string(),
            token_url: "https://isthereanydeal.com/oauth/token/".to_string(),
            scopes: ["user_info", "profiles", "wait_read", "wait_write"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl OAuthSection {
    /// Return the client id or a [`ConfigError::MissingField`].
    pub fn require_client_id(&self) -> Result<&str> {
        match self.client_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(ConfigError::MissingField {
                field: "client_id".to_string(),
                context: "[oauth] (or ITAD_CLIENT_ID)".to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream
// ─────────────────────────────────────────────────────────────────────────────

/// `[upstream]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSection {
    /// Price tracker API base URL.
    pub itad_api_url: String,
    /// Price tracker API key, sent with id lookups when present.
    pub itad_api_key: Option<String>,
    /// Steam Web API base URL.
    pub steam_api_url: String,
    /// Steam Web API key. Enables the profile visibility check on import.
    pub steam_api_key: Option<String>,
    /// Discord base URL that webhook paths are appended to.
    pub discord_api_url: String,
    /// Per-request timeout for outbound calls, in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            itad_api_url: "https://api.isthereanydeal.com".to_string(),
            itad_api_key: None,
            steam_api_url: "https://api.steampowered.com".to_string(),
            steam_api_key: None,
            discord_api_url: "https://discord.com".to_string(),
            timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}
