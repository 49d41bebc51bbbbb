//! Environment variable overrides.
//!
//! Applied after file layers and before CLI flags. Each variable replaces a
//! single field, creating the section with defaults when it was absent.

use std::path::PathBuf;

use crate::{ConfigError, DealhookConfig, Result};

/// Apply overrides from the process environment.
pub fn apply_env(config: &mut DealhookConfig) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup function.
///
/// Empty values are ignored.
pub fn apply_overrides<F>(config: &mut DealhookConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get("PORT") {
        let parsed = port.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
            key: "PORT".to_string(),
            value: port.clone(),
            reason: e.to_string(),
        })?;
        config.server.get_or_insert_with(Default::default).port = parsed;
    }
    if let Some(bind) = get("DEALHOOK_BIND") {
        config.server.get_or_insert_with(Default::default).bind = bind;
    }
    if let Some(db) = get("DEALHOOK_DATABASE") {
        config.store.get_or_insert_with(Default::default).database = PathBuf::from(db);
    }

    let oauth_vars = [
        get("ITAD_CLIENT_ID"),
        get("ITAD_REDIRECT_URL"),
        get("ITAD_AUTH_URL"),
        get("ITAD_TOKEN_URL"),
    ];
    if oauth_vars.iter().any(Option::is_some) {
        let [client_id, redirect_url, authorize_url, token_url] = oauth_vars;
        let oauth = config.oauth.get_or_insert_with(Default::default);
        if client_id.is_some() {
            oauth.client_id = client_id;
        }
        if let Some(v) = redirect_url {
            oauth.redirect_url = v;
        }
        if let Some(v) = authorize_url {
            oauth.authorize_url = v;
        }
        if let Some(v) = token_url {
            oauth.token_url = v;
        }
    }

    let upstream_vars = [
        get("ITAD_API_URL"),
        get("ITAD_API_KEY"),
        get("STEAM_API_URL"),
        get("STEAM_API_KEY"),
        get("DISCORD_API_URL"),
    ];
    if upstream_vars.iter().any(Option::is_some) {
        let [itad_url, itad_key, steam_url, steam_key, discord_url] = upstream_vars;
        let upstream = config.upstream.get_or_insert_with(Default::default);
        if let Some(v) = itad_url {
            upstream.itad_api_url = v;
        }
        if itad_key.is_some() {
            upstream.itad_api_key = itad_key;
        }
        if let Some(v) = steam_url {
            upstream.steam_api_url = v;
        }
        if steam_key.is_some() {
            upstream.steam_api_key = steam_key;
        }
        if let Some(v) = discord_url {
            upstream.discord_api_url = v;
        }
    }

    Ok(())
}
