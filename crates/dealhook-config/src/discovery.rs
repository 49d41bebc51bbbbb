//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/dealhook/config.toml` (user config dir)
//! 2. `./dealhook.toml` (project-local), or an explicit `--config` file
//! 3. Environment variables (see [`crate::env`])
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use crate::{ConfigError, DealhookConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "dealhook.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "dealhook";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "DEALHOOK_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: DealhookConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (e.g., plaintext API keys).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging the user and project layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None, None)
}

/// Load configuration with explicit control over each layer.
///
/// `config_dir` overrides both `DEALHOOK_CONFIG_DIR` and the platform default.
/// `explicit_file` replaces project-local discovery; unlike discovered files,
/// a missing or unparsable explicit file is an error.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    explicit_file: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = DealhookConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    match explicit_file {
        Some(path) => {
            config.merge(load_config_file(path)?);
            sources.push(ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            });
        }
        None => {
            let project_path = project_dir
                .map(|d| d.join(PROJECT_CONFIG_FILE))
                .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
            sources.push(load_layer(&mut config, &project_path, &mut warnings));
        }
    }

    check_plaintext_keys(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<DealhookConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    DealhookConfig::from_toml(&contents)
}

/// Path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// User config directory for dealhook.
///
/// Checks `DEALHOOK_CONFIG_DIR` first, then falls back to the platform default
/// (`~/.config/dealhook` on Linux).
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
///
/// A missing file is skipped; an unreadable one becomes a warning.
fn load_layer(config: &mut DealhookConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

fn check_plaintext_keys(config: &DealhookConfig, warnings: &mut Vec<String>) {
    if config.has_plaintext_api_key() {
        warnings.push(
            "[upstream] contains a plaintext API key. \
             Consider ITAD_API_KEY / STEAM_API_KEY environment variables instead."
                .to_string(),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_config_path_shape() {
        if let Some(p) = xdg_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();

        assert!(loaded.config.server.is_none());
        assert!(loaded.loaded_from().is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_load_config_layered_merge() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            "[server]\nport = 4000\n\n[oauth]\nclient_id = \"user-client\"\n",
        )
        .unwrap();
        fs::write(project.path().join("dealhook.toml"), "[server]\nport = 5000\n").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();

        assert_eq!(loaded.config.server().port, 5000);
        assert_eq!(loaded.config.oauth().client_id.as_deref(), Some("user-client"));
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_explicit_file_replaces_project_layer() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("dealhook.toml"), "[server]\nport = 5000\n").unwrap();
        let explicit = user.path().join("custom.toml");
        fs::write(&explicit, "[server]\nport = 6000\n").unwrap();

        let loaded =
            load_config_with_options(Some(project.path()), Some(user.path()), Some(&explicit))
                .unwrap();
        assert_eq!(loaded.config.server().port, 6000);
    }

    #[test]
    fn test_explicit_file_missing_is_error() {
        let user = TempDir::new().unwrap();
        let missing = user.path().join("missing.toml");
        let result = load_config_with_options(None, Some(user.path()), Some(&missing));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_invalid_discovered_file_becomes_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "not toml {{").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_plaintext_key_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            project.path().join("dealhook.toml"),
            "[upstream]\nsteam_api_key = \"secret\"\n",
        )
        .unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert!(loaded.warnings.iter().any(|w| w.contains("plaintext")));
    }
}
