// src/session/expiry.rs
// The single predicate deciding whether a data-call response means the
// session has expired. The platform never says so explicitly; it answers
// with a 401/403, an envelope status code, or a bounce back to the login
// host. Call sites must not inspect payloads themselves - when the
// platform changes its signals, this is the only place to update.

use super::urls::PlatformUrls;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

/// Does this response to an authenticated data call indicate an expired
/// session?
///
/// Note the asymmetry with login: a 403 *during the login probe* means bad
/// credentials and is handled there, not here.
pub fn session_expired_response(
    status: StatusCode,
    final_url: &Url,
    body: Option<&Value>,
    urls: &PlatformUrls,
) -> bool {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return true;
    }

    // A data call that ends up on the login host was redirected there
    if final_url.as_str().starts_with(&urls.login_url) {
        return true;
    }

    // Envelope-level expiry: HTTP 200 carrying {"status": {"code": 403}}
    matches!(envelope_code(body), Some(403))
}

fn envelope_code(body: Option<&Value>) -> Option<i64> {
    body?.get("status")?.get("code")?.as_i64()
}
