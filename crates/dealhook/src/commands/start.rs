//! Start command - launches the dealhook server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;

use dealhook_config::DealhookConfig;
use dealhook_oauth::{OAuthClient, OAuthConfig};
use dealhook_server::{AppState, Server, ServerConfig};
use dealhook_store::Store;
use dealhook_upstream::{UpstreamClients, UpstreamConfig};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file and environment values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// SQLite database file (overrides config)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    // ── Load configuration ──────────────────────────────────────────────

    let loaded = super::load_resolved_config(args.config.as_deref())?;
    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }
    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + environment");
        }
        for source in sources {
            println!("Loaded config: {}", source.display());
        }
    }

    let mut config = loaded.config;
    apply_flags(&mut config, &args);

    let oauth_section = config.oauth();
    let client_id = oauth_section.require_client_id()?.to_string();

    let server_section = config.server();
    let addr: SocketAddr = format!("{}:{}", server_section.bind, server_section.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                server_section.bind, server_section.port
            )
        })?;

    // ── Store ───────────────────────────────────────────────────────────

    let db_path = config.store().resolve_database(&super::data_dir());
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = Arc::new(
        Store::open(&db_path).with_context(|| format!("Failed to open {}", db_path.display()))?,
    );
    tracing::info!(path = %db_path.display(), "Opened store");

    // ── Clients ─────────────────────────────────────────────────────────

    let upstream_section = config.upstream();
    let timeout = Duration::from_secs(upstream_section.timeout_secs);

    let oauth = OAuthClient::with_timeout(
        OAuthConfig::new(
            client_id,
            oauth_section.authorize_url,
            oauth_section.token_url,
            oauth_section.redirect_url,
            &oauth_section.scopes,
        ),
        timeout,
    )?;

    let upstream = UpstreamClients::new(&UpstreamConfig {
        itad_api_url: upstream_section.itad_api_url,
        itad_api_key: upstream_section.itad_api_key,
        steam_api_url: upstream_section.steam_api_url,
        steam_api_key: upstream_section.steam_api_key,
        discord_api_url: upstream_section.discord_api_url,
        timeout,
    })?;

    // ── Server ──────────────────────────────────────────────────────────

    let server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_request_logging(server_section.request_logging)
        .with_cors_origins(server_section.cors_origins)
        .with_max_body_size(server_section.max_body_size);

    let state = AppState::new(server_config, Arc::clone(&store), oauth, upstream);
    println!("Listening on http://{}", addr);

    Server::from_state(state)
        .run_with_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(_) => tracing::warn!("Store still in use at shutdown; skipping explicit close"),
    }

    Ok(())
}

/// CLI flags are the last configuration layer.
fn apply_flags(config: &mut DealhookConfig, args: &StartArgs) {
    if args.port.is_some() || args.bind.is_some() {
        let server = config.server.get_or_insert_with(Default::default);
        if let Some(port) = args.port {
            server.port = port;
        }
        if let Some(bind) = &args.bind {
            server.bind = bind.clone();
        }
    }
    if let Some(database) = &args.database {
        config.store.get_or_insert_with(Default::default).database = database.clone();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
