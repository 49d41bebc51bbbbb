//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::MockServer;

use dealhook_oauth::{OAuthClient, OAuthConfig};
use dealhook_server::{AppState, Server, ServerConfig};
use dealhook_store::Store;
use dealhook_upstream::{UpstreamClients, UpstreamConfig};

/// A test server that runs in the background, with every upstream pointed at
/// a single mock server.
pub struct TestServer {
    pub addr: SocketAddr,
    /// HTTP client that does not follow redirects.
    pub client: Client,
    /// Stand-in for the price tracker, Steam, Discord and the token endpoint.
    pub upstream: MockServer,
    _handle: JoinHandle<()>,
    pub temp_dir: TempDir,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with_steam_key(None).await
    }

    pub async fn start_with_steam_key(steam_api_key: Option<&str>) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let upstream = MockServer::start().await;

        let store = Store::open(&temp_dir.path().join("dealhook.db"))?;
        let oauth = OAuthClient::new(OAuthConfig::new(
            "test-client",
            format!("{}/oauth/authorize/", upstream.uri()),
            format!("{}/oauth/token/", upstream.uri()),
            "http://localhost:3000/api/auth/redirect",
            &["wait_read".to_string(), "wait_write".to_string()],
        ))?;
        let clients = UpstreamClients::new(&UpstreamConfig {
            itad_api_url: upstream.uri(),
            itad_api_key: None,
            steam_api_url: upstream.uri(),
            steam_api_key: steam_api_key.map(String::from),
            discord_api_url: upstream.uri(),
            timeout: Duration::from_secs(5),
        })?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);
        let state = AppState::new(config, Arc::new(store), oauth, clients);

        let server = Server::from_state(state);
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener, std::future::pending()).await;
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            upstream,
            _handle: handle,
            temp_dir,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Register a webhook and return its identifier.
    pub async fn register_channel(&self, credential: &str, secret: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.url("/api/adapter"))
            .json(&serde_json::json!({
                "url": format!("https://discord.com/api/webhooks/{}/{}", credential, secret)
            }))
            .send()
            .await?;
        anyhow::ensure!(resp.status().is_success(), "register failed: {}", resp.status());

        let body: serde_json::Value = resp.json().await?;
        body["document"]["identifier"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow::anyhow!("missing identifier"))
    }
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
