// src/session/urls.rs
// Platform endpoints. Grouped in one struct so tests can point the whole
// client at a local stand-in.

/// Versioned API base; the concrete version is probed at login
pub const API_BASE: &str = "https://www.aula.dk/api/v";

/// Baseline API version to start probing from
pub const API_VERSION: u32 = 20;

/// Login broker entry point
pub const LOGIN_URL: &str = "https://login.aula.dk/auth/login.php";

/// Final URL of a successful login chain
pub const PORTAL_URL: &str = "https://www.aula.dk/portal/";

/// Supplementary weekly-plan / homework API
pub const MIN_UDDANNELSE_API: &str = "https://api.minuddannelse.net/aula";

/// All platform endpoints used by a session
#[derive(Debug, Clone)]
pub struct PlatformUrls {
    pub login_url: String,
    pub portal_url: String,
    pub api_base: String,
    pub api_version: u32,
    pub min_uddannelse_api: String,
}

impl Default for PlatformUrls {
    fn default() -> Self {
        Self {
            login_url: LOGIN_URL.to_string(),
            portal_url: PORTAL_URL.to_string(),
            api_base: API_BASE.to_string(),
            api_version: API_VERSION,
            min_uddannelse_api: MIN_UDDANNELSE_API.to_string(),
        }
    }
}
