//! CLI command handlers.

pub mod config;
pub mod start;

use std::path::PathBuf;

use anyhow::Result;

use dealhook_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Discover config files (or read `explicit`), then apply environment overrides.
pub fn load_resolved_config(explicit: Option<&std::path::Path>) -> Result<LoadedConfig> {
    let mut loaded = dealhook_config::load_config_with_options(None, None, explicit)?;
    dealhook_config::apply_env(&mut loaded.config)?;
    Ok(loaded)
}

/// Directory that relative store paths resolve under.
pub fn data_dir() -> PathBuf {
    dealhook_config::xdg_config_dir().unwrap_or_else(|| PathBuf::from("."))
}
