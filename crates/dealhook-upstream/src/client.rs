//! Shared HTTP plumbing for the upstream clients.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::discord::DiscordClient;
use crate::error::{Result, UpstreamError};
use crate::itad::ItadClient;
use crate::steam::SteamClient;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Endpoints and credentials for every upstream.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub itad_api_url: String,
    pub itad_api_key: Option<String>,
    pub steam_api_url: String,
    pub steam_api_key: Option<String>,
    pub discord_api_url: String,
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            itad_api_url: "https://api.isthereanydeal.com".to_string(),
            itad_api_key: None,
            steam_api_url: "https://api.steampowered.com".to_string(),
            steam_api_key: None,
            discord_api_url: "https://discord.com".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Status and JSON body of an upstream response, relayed to the caller as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The three upstream clients built over a single connection pool.
#[derive(Clone)]
pub struct UpstreamClients {
    pub itad: ItadClient,
    pub steam: SteamClient,
    pub discord: DiscordClient,
}

impl UpstreamClients {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("dealhook/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            itad: ItadClient::new(
                http.clone(),
                &config.itad_api_url,
                config.itad_api_key.clone(),
            )?,
            steam: SteamClient::new(
                http.clone(),
                &config.steam_api_url,
                config.steam_api_key.clone(),
            )?,
            discord: DiscordClient::new(http, &config.discord_api_url)?,
        })
    }
}

/// A base URL plus the pooled HTTP client.
#[derive(Debug)]
pub(crate) struct Endpoint {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
}

impl Endpoint {
    pub(crate) fn new(http: reqwest::Client, base_url: &str) -> Result<Arc<Self>> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Ok(Arc::new(Self { http, base_url }))
    }

    /// Send a request, stripping the URL from any transport error so query
    /// keys and webhook secrets never reach the logs.
    pub(crate) async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        request
            .send()
            .await
            .map_err(|e| UpstreamError::Http(e.without_url()))
    }

    /// Build a URL for a path relative to the base.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(UpstreamError::from)
    }
}

/// Read a response body as JSON, falling back to a string for error bodies.
///
/// A 2xx response whose body is not JSON is [`UpstreamError::Malformed`].
pub(crate) async fn passthrough(response: reqwest::Response) -> Result<UpstreamResponse> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| UpstreamError::Http(e.without_url()))?;

    let body = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) if status.is_success() => {
            return Err(UpstreamError::Malformed(e.to_string()));
        }
        Err(_) => serde_json::Value::String(text),
    };

    Ok(UpstreamResponse {
        status: status.as_u16(),
        body,
    })
}

/// Decode a JSON body, reporting failures as [`UpstreamError::Malformed`].
pub(crate) async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| UpstreamError::Malformed(e.without_url().to_string()))
}

/// Turn a non-success response into [`UpstreamError::Status`].
pub(crate) async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
    Err(UpstreamError::Status {
        status: status.as_u16(),
        message,
    })
}
