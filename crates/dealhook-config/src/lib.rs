//! Configuration system for dealhook.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[store]`, `[oauth]` and `[upstream]` sections
//! - Config file layering (user config dir + project-local `dealhook.toml`)
//! - Environment overrides for deployment (`PORT`, `ITAD_CLIENT_ID`, `STEAM_API_KEY`, ...)

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    xdg_config_dir, xdg_config_path,
};
pub use env::{apply_env, apply_overrides};
pub use error::{ConfigError, Result};
pub use types::*;
