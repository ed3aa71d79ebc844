// src/config/file.rs
// File-based configuration from ~/.aula-mcp/config.toml

use super::AulaConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Load config from `~/.aula-mcp/config.toml`, falling back to defaults
/// when the file is missing or malformed
pub fn load_config_file() -> AulaConfig {
    load_from(&config_path())
}

/// Load config from an explicit path
pub fn load_from(path: &Path) -> AulaConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config from file");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse config file");
                AulaConfig::default()
            }
        },
        Err(_) => {
            debug!(path = %path.display(), "Config file not found, using defaults");
            AulaConfig::default()
        }
    }
}

/// Get the config file path
fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aula-mcp")
        .join("config.toml")
}
