// src/session/login.rs
// The multi-step login protocol: broker page -> IdP selection -> hidden-form
// redirect chain with credential overlay -> API version probe.
//
// Every hop parses an HTML form the platform controls; a missing form is an
// authentication failure, not a parse warning - without it the flow cannot
// continue.

use super::urls::PlatformUrls;
use crate::error::{AulaError, Result};
use crate::model::Profile;
use crate::parse::profiles::parse_profiles;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

/// Hidden-form hops before giving up (the real chain is 3-5)
const MAX_LOGIN_HOPS: usize = 10;

/// API versions probed past the baseline before giving up
const MAX_VERSION_PROBES: u32 = 5;

/// The actor role submitted alongside credentials
const ACTOR_FIELD: (&str, &str) = ("selected-aktoer", "KONTAKT");

/// Cookie carrying the CSRF token for API calls
const CSRF_COOKIE: &str = "Csrfp-Token";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Everything a successful login yields
#[derive(Debug)]
pub struct LoginOutcome {
    pub api_url: String,
    pub csrf_token: Option<String>,
    pub profiles: Vec<Profile>,
}

/// Run the full login protocol against the platform
pub async fn run(
    http: &reqwest::Client,
    urls: &PlatformUrls,
    credentials: &Credentials,
) -> Result<LoginOutcome> {
    let mut csrf_token = None;

    // Step 1: broker page, selecting the unilogin flow
    let response = http
        .get(&urls.login_url)
        .query(&[("type", "unilogin")])
        .header("Accept", "text/html,application/xhtml+xml")
        .header("Accept-Language", "da,en-US;q=0.7,en;q=0.3")
        .send()
        .await?;
    let page_url = response.url().clone();
    let html = response.text().await?;
    let action = form_action(&html, &page_url).ok_or_else(|| {
        AulaError::Authentication("could not find login form on the broker page".to_string())
    })?;

    // Step 2: submit the selected identity provider
    let mut response = http
        .post(action)
        .form(&[("selectedIdp", "uni_idp")])
        .send()
        .await?;

    // Step 3: hidden-form redirect chain with credential overlay
    let mut hops = 0;
    loop {
        let page_url = response.url().clone();
        remember_csrf(&response, &mut csrf_token);

        if reached_portal(&page_url, urls) {
            debug!(hops, "Login chain reached the portal");
            break;
        }
        if hops >= MAX_LOGIN_HOPS {
            return Err(AulaError::Authentication(format!(
                "login did not reach the portal within {MAX_LOGIN_HOPS} steps"
            )));
        }

        let html = response.text().await?;
        let Some(action) = form_action(&html, &page_url) else {
            // The chain dead-ends on a form-less page when credentials are
            // rejected; the platform shows an error page instead.
            return Err(AulaError::Authentication(format!(
                "login chain broke after {hops} steps (no form action)"
            )));
        };

        let fields = chain_fields(&html, credentials);
        response = http.post(action).form(&fields).send().await?;
        hops += 1;
    }

    // Step 4: probe for a working API version and load profiles
    let (api_url, profiles) = probe_api(http, urls, &mut csrf_token).await?;

    if csrf_token.is_none() {
        warn!("No {CSRF_COOKIE} cookie seen during login");
    }
    info!(
        api_url = %api_url,
        children = profiles.iter().map(|p| p.children.len()).sum::<usize>(),
        "Login successful"
    );

    Ok(LoginOutcome {
        api_url,
        csrf_token,
        profiles,
    })
}

/// Find the working API version: the platform answers 410 for retired
/// versions, 403 for bad credentials and 200 for a live one.
async fn probe_api(
    http: &reqwest::Client,
    urls: &PlatformUrls,
    csrf_token: &mut Option<String>,
) -> Result<(String, Vec<Profile>)> {
    let mut version = urls.api_version;

    for _ in 0..=MAX_VERSION_PROBES {
        let api_url = format!("{}{}", urls.api_base, version);
        debug!(api_url = %api_url, "Probing API version");

        let response = http
            .get(&api_url)
            .query(&[("method", "profiles.getProfilesByLogin")])
            .send()
            .await?;
        remember_csrf(&response, csrf_token);

        match response.status().as_u16() {
            410 => {
                debug!(version, "API version gone, trying a newer one");
                version += 1;
            }
            403 => {
                return Err(AulaError::Authentication(
                    "access to the API was denied; check credentials".to_string(),
                ));
            }
            200 => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| AulaError::Parse(format!("profile response: {e}")))?;
                let data = body.get("data").ok_or_else(|| {
                    AulaError::Parse("profile response has no data".to_string())
                })?;
                let parsed = parse_profiles(data)?;
                for warning in &parsed.warnings {
                    warn!(detail = %warning.detail, "Profile normalization warning");
                }
                return Ok((api_url, parsed.records));
            }
            other => {
                return Err(AulaError::Transport(format!(
                    "unexpected status {other} while probing the API"
                )));
            }
        }
    }

    Err(AulaError::Transport(format!(
        "no working API version within {MAX_VERSION_PROBES} probes of v{}",
        urls.api_version
    )))
}

/// First form action on the page, resolved against the page URL
pub(super) fn form_action(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("form").ok()?;
    let action = document.select(&selector).next()?.value().attr("action")?;
    base.join(action).ok()
}

/// Carry over every named input, overlaying credentials where the form
/// asks for them
pub(super) fn chain_fields(html: &str, credentials: &Credentials) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let mut fields = Vec::new();

    if let Ok(selector) = Selector::parse("input[name]") {
        for input in document.select(&selector) {
            let Some(name) = input.value().attr("name") else {
                continue;
            };
            let value = match name {
                "username" => credentials.username.clone(),
                "password" => credentials.password.clone(),
                name if name == ACTOR_FIELD.0 => ACTOR_FIELD.1.to_string(),
                _ => match input.value().attr("value") {
                    Some(v) => v.to_string(),
                    None => continue,
                },
            };
            fields.push((name.to_string(), value));
        }
    }
    fields
}

fn reached_portal(url: &Url, urls: &PlatformUrls) -> bool {
    url.as_str().starts_with(&urls.portal_url)
        || url.as_str().trim_end_matches('/') == urls.portal_url.trim_end_matches('/')
}

/// Capture the CSRF cookie whenever a response sets it
fn remember_csrf(response: &reqwest::Response, csrf_token: &mut Option<String>) {
    if let Some(cookie) = response.cookies().find(|c| c.name() == CSRF_COOKIE) {
        *csrf_token = Some(cookie.value().to_string());
    }
}
