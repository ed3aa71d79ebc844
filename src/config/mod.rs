// src/config/mod.rs
// Configuration: file-based defaults overlaid with environment variables

mod env;
mod file;

pub use env::apply_env_overrides;
pub use file::load_config_file;

use crate::error::{AulaError, Result};
use serde::Deserialize;

/// Client configuration.
///
/// Credentials are required; the three feature flags select which calendar
/// data sources are fetched and default to enabled.
#[derive(Debug, Clone, Deserialize)]
pub struct AulaConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Primary school-schedule calendar source
    #[serde(default = "default_true")]
    pub schoolschedule: bool,
    /// Supplementary weekly-plan source
    #[serde(default = "default_true")]
    pub ugeplan: bool,
    /// Supplementary homework-task source
    #[serde(default = "default_true")]
    pub mu_opgaver: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AulaConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            schoolschedule: true,
            ugeplan: true,
            mu_opgaver: true,
        }
    }
}

impl AulaConfig {
    /// Load configuration: `~/.aula-mcp/config.toml` first, then
    /// environment variables on top (env wins).
    pub fn load() -> Result<Self> {
        let mut config = load_config_file();
        apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Check that required fields are present
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(AulaError::Config(
                "username is required (config file or AULA_USERNAME)".to_string(),
            ));
        }
        if self.password.trim().is_empty() {
            return Err(AulaError::Config(
                "password is required (config file or AULA_PASSWORD)".to_string(),
            ));
        }
        Ok(())
    }

    /// Human-readable summary of enabled calendar sources (no credentials)
    pub fn source_summary(&self) -> String {
        let mut sources = Vec::new();
        if self.schoolschedule {
            sources.push("schedule");
        }
        if self.ugeplan {
            sources.push("weekly plan");
        }
        if self.mu_opgaver {
            sources.push("homework");
        }
        if sources.is_empty() {
            "none".to_string()
        } else {
            sources.join(", ")
        }
    }
}
