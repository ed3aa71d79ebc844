// src/http.rs
// Shared HTTP client for all platform traffic

use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum HTTP-level redirects to follow (the login flow also chains
/// form POSTs on top of these)
pub const MAX_REDIRECTS: usize = 10;

/// Browser-like user agent; the login broker rejects obviously
/// non-browser clients
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:120.0) Gecko/20100101 Firefox/120.0";

/// Create the shared HTTP client with appropriate defaults.
///
/// This client should be created once per session and passed to all modules
/// that need platform access. The cookie store is the session's cookie jar;
/// connection pooling is internal.
pub fn create_shared_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
