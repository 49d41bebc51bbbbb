//! Application state shared across handlers.

use std::sync::Arc;

use dealhook_oauth::OAuthClient;
use dealhook_store::Store;
use dealhook_upstream::UpstreamClients;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Channel and token mappings.
    pub store: Arc<Store>,

    /// OAuth client for the price tracker.
    pub oauth: Arc<OAuthClient>,

    /// Price tracker, Steam and Discord clients.
    pub upstream: UpstreamClients,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: ServerConfig,
        store: Arc<Store>,
        oauth: OAuthClient,
        upstream: UpstreamClients,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            oauth: Arc::new(oauth),
            upstream,
        }
    }

    /// Replace the server configuration.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Run a store operation on the blocking pool.
    pub async fn store_op<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Store) -> dealhook_store::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| ServerError::Internal(format!("Store task failed: {}", e)))?
            .map_err(ServerError::from)
    }
}
