// src/session/mod.rs
// Session manager: owns the authenticated HTTP session and its lifecycle

pub mod expiry;
mod login;
mod urls;

pub use expiry::session_expired_response;
pub use login::Credentials;
pub use urls::PlatformUrls;

use crate::config::AulaConfig;
use crate::error::{AulaError, Result};
use crate::model::{Child, Profile};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Widget bearer tokens are reused within this window
const TOKEN_REUSE: Duration = Duration::from_secs(60);

/// Authentication lifecycle. `Failed` is terminal for the request that hit
/// it; the next operation may attempt a fresh login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// A data call saw an expiry signal; the next request re-logs-in once
    Stale,
    Failed,
}

#[derive(Debug, Default)]
struct SessionData {
    api_url: String,
    csrf_token: Option<String>,
    profiles: Vec<Profile>,
    widget_tokens: HashMap<String, WidgetToken>,
}

#[derive(Debug)]
struct WidgetToken {
    token: String,
    fetched_at: Instant,
}

struct Inner {
    state: SessionState,
    data: SessionData,
}

/// What an authenticated request needs from the session
#[derive(Debug, Clone)]
struct RequestContext {
    api_url: String,
    csrf_token: Option<String>,
}

/// Owns the cookie jar, tokens and profile set of one authenticated
/// session. One instance per client; login and refresh serialize through
/// the single internal mutex, data calls clone what they need and run
/// concurrently.
pub struct SessionManager {
    http: reqwest::Client,
    credentials: Credentials,
    urls: PlatformUrls,
    inner: Mutex<Inner>,
}

impl SessionManager {
    pub fn new(config: &AulaConfig) -> Self {
        Self::with_urls(config, PlatformUrls::default())
    }

    /// Point the session at explicit endpoints (tests use a local stand-in)
    pub fn with_urls(config: &AulaConfig, urls: PlatformUrls) -> Self {
        Self {
            http: crate::http::create_shared_client(),
            credentials: Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            },
            urls,
            inner: Mutex::new(Inner {
                state: SessionState::Unauthenticated,
                data: SessionData::default(),
            }),
        }
    }

    pub fn urls(&self) -> &PlatformUrls {
        &self.urls
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Log in. Idempotent: a call while authenticated is a no-op unless the
    /// session was marked stale.
    pub async fn login(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.state == SessionState::Authenticated {
            debug!("Already authenticated, login is a no-op");
            return Ok(());
        }
        self.perform_login(&mut inner).await
    }

    /// Force a fresh login, discarding any current session
    pub async fn force_login(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Unauthenticated;
        inner.data = SessionData::default();
        self.perform_login(&mut inner).await
    }

    async fn perform_login(&self, inner: &mut Inner) -> Result<()> {
        inner.state = SessionState::Authenticating;
        info!("Logging in to the platform");

        match login::run(&self.http, &self.urls, &self.credentials).await {
            Ok(outcome) => {
                inner.data = SessionData {
                    api_url: outcome.api_url,
                    csrf_token: outcome.csrf_token,
                    profiles: outcome.profiles,
                    widget_tokens: HashMap::new(),
                };
                inner.state = SessionState::Authenticated;
                Ok(())
            }
            Err(e) => {
                inner.state = SessionState::Failed;
                warn!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    /// Make sure a valid session exists before a data call, logging in when
    /// there is none (or the previous call marked it stale)
    async fn ensure_authenticated(&self) -> Result<RequestContext> {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Authenticated {
            self.perform_login(&mut inner).await?;
        }
        Ok(RequestContext {
            api_url: inner.data.api_url.clone(),
            csrf_token: inner.data.csrf_token.clone(),
        })
    }

    async fn mark_stale(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == SessionState::Authenticated {
            inner.state = SessionState::Stale;
        }
    }

    async fn mark_failed(&self) {
        self.inner.lock().await.state = SessionState::Failed;
    }

    /// Children across all profiles of the current session
    pub async fn children(&self) -> Vec<Child> {
        let inner = self.inner.lock().await;
        inner
            .data
            .profiles
            .iter()
            .flat_map(|p| p.children.clone())
            .collect()
    }

    /// Authenticated GET against the versioned API
    pub async fn api_get(&self, method: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.api_call(method, params, None).await
    }

    /// Authenticated POST against the versioned API
    pub async fn api_post(
        &self,
        method: &str,
        params: &[(&str, &str)],
        body: Value,
    ) -> Result<Value> {
        self.api_call(method, params, Some(body)).await
    }

    /// One authenticated call with exactly one transparent re-login when
    /// the response carries an expiry signal. No unbounded retry loop: the
    /// second expiry surfaces as `SessionExpired`.
    async fn api_call(
        &self,
        method: &str,
        params: &[(&str, &str)],
        post: Option<Value>,
    ) -> Result<Value> {
        let request_id = uuid::Uuid::new_v4();
        let mut retried = false;
        loop {
            let ctx = self.ensure_authenticated().await?;
            let url = build_api_url(&ctx.api_url, method, params);
            debug!(request_id = %request_id, method, retried, "API call");

            let mut request = match &post {
                Some(body) => self.http.post(&url).json(body),
                None => self.http.get(&url),
            };
            if let Some(token) = &ctx.csrf_token {
                request = request.header("csrfp-token", token);
            }

            let response = request.send().await?;
            let status = response.status();
            let final_url = response.url().clone();
            let body: Option<Value> = response.json().await.ok();

            if session_expired_response(status, &final_url, body.as_ref(), &self.urls) {
                if retried {
                    self.mark_failed().await;
                    return Err(AulaError::SessionExpired);
                }
                warn!(request_id = %request_id, method, "Session expiry detected, re-authenticating once");
                self.mark_stale().await;
                retried = true;
                continue;
            }

            if !status.is_success() {
                return Err(AulaError::Transport(format!(
                    "API error {status} on {method}"
                )));
            }
            return body
                .ok_or_else(|| AulaError::Parse(format!("non-JSON response from {method}")));
        }
    }

    /// Authenticated GET where a forbidden answer is data, not an expiry
    /// signal: sensitive message threads answer 403 until the guardian
    /// steps up with MitID. Returns None for those; single attempt.
    pub async fn api_get_guarded(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        let ctx = self.ensure_authenticated().await?;
        let url = build_api_url(&ctx.api_url, method, params);
        debug!(method, "Guarded API call");

        let mut request = self.http.get(&url);
        if let Some(token) = &ctx.csrf_token {
            request = request.header("csrfp-token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        let envelope_forbidden = body
            .as_ref()
            .and_then(|b| b.get("status"))
            .and_then(|s| s.get("code"))
            .and_then(Value::as_i64)
            == Some(403);
        if status == reqwest::StatusCode::FORBIDDEN || envelope_forbidden {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(AulaError::Transport(format!(
                "API error {status} on {method}"
            )));
        }
        body.map(Some)
            .ok_or_else(|| AulaError::Parse(format!("non-JSON response from {method}")))
    }

    /// Bearer token for a platform widget, reused within a short window
    pub async fn widget_token(&self, widget_id: &str) -> Result<String> {
        {
            let inner = self.inner.lock().await;
            if let Some(token) = inner.data.widget_tokens.get(widget_id)
                && token.fetched_at.elapsed() < TOKEN_REUSE
            {
                debug!(widget_id, "Reusing widget token");
                return Ok(token.token.clone());
            }
        }

        debug!(widget_id, "Requesting new widget token");
        let body = self
            .api_get("aulaToken.getAulaToken", &[("widgetId", widget_id)])
            .await?;
        let raw = body
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| AulaError::Parse("token response has no data".to_string()))?;
        let token = format!("Bearer {raw}");

        let mut inner = self.inner.lock().await;
        inner.data.widget_tokens.insert(
            widget_id.to_string(),
            WidgetToken {
                token: token.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(token)
    }

    /// GET against a supplementary widget-authorized API
    pub async fn widget_get(
        &self,
        url: &str,
        widget_id: &str,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let token = self.widget_token(widget_id).await?;
        let response = self
            .http
            .get(url)
            .query(params)
            .header("Authorization", token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AulaError::Transport(format!(
                "supplementary API error {status}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| AulaError::Parse(format!("supplementary response: {e}")))
    }
}

/// `{api_url}?method=X&key=value` with encoded values, the query shape the
/// platform expects
fn build_api_url(api_url: &str, method: &str, params: &[(&str, &str)]) -> String {
    let mut url = format!("{api_url}?method={method}");
    for (key, value) in params {
        url.push('&');
        url.push_str(key);
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}
