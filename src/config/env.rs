// src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use super::AulaConfig;
use tracing::debug;

/// Overlay environment variables onto a loaded config (env wins).
///
/// Recognized: `AULA_USERNAME`, `AULA_PASSWORD`, `AULA_SCHOOLSCHEDULE`,
/// `AULA_UGEPLAN`, `AULA_MU_OPGAVER`.
pub fn apply_env_overrides(config: &mut AulaConfig) {
    if let Some(username) = read_var("AULA_USERNAME") {
        config.username = username;
    }
    if let Some(password) = read_var("AULA_PASSWORD") {
        config.password = password;
    }
    if let Some(v) = parse_bool_env("AULA_SCHOOLSCHEDULE") {
        config.schoolschedule = v;
    }
    if let Some(v) = parse_bool_env("AULA_UGEPLAN") {
        config.ugeplan = v;
    }
    if let Some(v) = parse_bool_env("AULA_MU_OPGAVER") {
        config.mu_opgaver = v;
    }

    debug!(
        username_set = !config.username.is_empty(),
        sources = %config.source_summary(),
        "Environment overrides applied"
    );
}

/// Read a single variable, filtering empty values
fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool_env(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?.to_lowercase();
    match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_env_unset() {
        assert_eq!(parse_bool_env("AULA_TEST_UNSET_VAR"), None);
    }

    #[test]
    fn test_overrides_keep_existing_when_env_empty() {
        let mut config = AulaConfig {
            username: "from-file".to_string(),
            password: "pw".to_string(),
            ..Default::default()
        };
        // No AULA_* vars set in the test environment for these fields
        apply_env_overrides(&mut config);
        assert_eq!(config.username, "from-file");
    }
}
