// tests/common/mod.rs
// A local stand-in for the platform: the login broker, the versioned API
// and the supplementary weekly-plan API, with per-endpoint hit counters so
// tests can assert on network behavior.

use aula::config::AulaConfig;
use aula::data::DataManager;
use aula::session::{PlatformUrls, SessionManager};
use axum::extract::{Form, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Days, Local, NaiveTime, TimeZone};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const USERNAME: &str = "parent";
pub const PASSWORD: &str = "secret";
pub const CSRF_VALUE: &str = "mock-csrf";

#[derive(Default)]
pub struct MockState {
    /// GET hits on the login broker page (= authentication attempts)
    pub login_pages: AtomicUsize,
    /// Credential-form submissions
    pub credential_posts: AtomicUsize,
    /// Per-method API hits
    pub api_hits: Mutex<HashMap<String, usize>>,
    /// Last csrfp-token header seen on an API call
    pub last_csrf_header: Mutex<Option<String>>,
    /// When set, every data method answers an envelope-403 expiry signal
    pub expire_data_calls: AtomicBool,
}

pub struct MockPlatform {
    pub base: String,
    pub state: Arc<MockState>,
}

impl MockPlatform {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/auth/login.php", get(login_page))
            .route("/auth/idp", post(idp_page))
            .route("/auth/credentials", post(credentials))
            .route("/portal/", get(portal))
            .route("/api/v18", get(gone).post(gone))
            .route("/api/v19", get(gone).post(gone))
            .route("/api/v20", get(api).post(api))
            .route("/mu/ugebreve", get(weekly_plan))
            .route("/mu/opgaver", get(homework))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock platform");
        let addr = listener.local_addr().expect("mock platform addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: format!("http://{addr}"),
            state,
        }
    }

    /// Endpoints of this stand-in, probing from a retired API version so
    /// the version probe is exercised too
    pub fn urls(&self) -> PlatformUrls {
        PlatformUrls {
            login_url: format!("{}/auth/login.php", self.base),
            portal_url: format!("{}/portal/", self.base),
            api_base: format!("{}/api/v", self.base),
            api_version: 18,
            min_uddannelse_api: format!("{}/mu", self.base),
        }
    }

    pub fn config(&self) -> AulaConfig {
        AulaConfig {
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            ..Default::default()
        }
    }

    pub fn session(&self) -> Arc<SessionManager> {
        Arc::new(SessionManager::with_urls(&self.config(), self.urls()))
    }

    pub fn session_with_config(&self, config: &AulaConfig) -> Arc<SessionManager> {
        Arc::new(SessionManager::with_urls(config, self.urls()))
    }

    pub fn manager(&self) -> DataManager {
        DataManager::new(self.session(), self.config())
    }

    pub fn manager_with_config(&self, config: AulaConfig) -> DataManager {
        DataManager::new(self.session_with_config(&config), config)
    }

    pub fn login_attempts(&self) -> usize {
        self.state.login_pages.load(Ordering::SeqCst)
    }

    pub fn api_hits(&self, method: &str) -> usize {
        self.state
            .api_hits
            .lock()
            .expect("api_hits lock")
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    pub fn expire_data_calls(&self) {
        self.state.expire_data_calls.store(true, Ordering::SeqCst);
    }
}

async fn login_page(State(state): State<Arc<MockState>>) -> Html<&'static str> {
    state.login_pages.fetch_add(1, Ordering::SeqCst);
    Html(r#"<html><body><form action="/auth/idp" method="post"></form></body></html>"#)
}

async fn idp_page() -> Html<&'static str> {
    Html(
        r#"<html><body>
        <form action="/auth/credentials" method="post">
            <input type="hidden" name="token" value="hidden-token-1">
            <input type="text" name="username" value="">
            <input type="password" name="password" value="">
            <input type="hidden" name="selected-aktoer" value="">
        </form>
        </body></html>"#,
    )
}

async fn credentials(
    State(state): State<Arc<MockState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    state.credential_posts.fetch_add(1, Ordering::SeqCst);

    let ok = fields.get("username").map(String::as_str) == Some(USERNAME)
        && fields.get("password").map(String::as_str) == Some(PASSWORD)
        && fields.get("token").map(String::as_str) == Some("hidden-token-1")
        && fields.get("selected-aktoer").map(String::as_str) == Some("KONTAKT");

    if ok {
        Redirect::to("/portal/").into_response()
    } else {
        // Rejected credentials land on a form-less error page
        Html(r#"<html><body><p>Forkert brugernavn eller adgangskode.</p></body></html>"#)
            .into_response()
    }
}

async fn portal() -> &'static str {
    "portal"
}

async fn gone() -> Response {
    (axum::http::StatusCode::GONE, "gone").into_response()
}

async fn api(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let method = params.get("method").cloned().unwrap_or_default();
    *state
        .api_hits
        .lock()
        .expect("api_hits lock")
        .entry(method.clone())
        .or_insert(0) += 1;

    if let Some(token) = headers.get("csrfp-token").and_then(|v| v.to_str().ok()) {
        *state.last_csrf_header.lock().expect("csrf lock") = Some(token.to_string());
    }

    let expired = state.expire_data_calls.load(Ordering::SeqCst);

    match method.as_str() {
        "profiles.getProfilesByLogin" => {
            let body = json!({
                "status": {"message": "OK", "code": 0},
                "data": {"profiles": [{
                    "children": [
                        {"id": "child-1", "name": "Alma", "userId": "alma01",
                         "institutionProfile": {"institutionName": "Nordskolen"}},
                        {"id": "child-2", "name": "Bertram", "userId": "bertram01",
                         "institutionProfile": {"institutionName": "Nordskolen"}}
                    ]
                }]}
            });
            (
                [(axum::http::header::SET_COOKIE, format!("Csrfp-Token={CSRF_VALUE}; Path=/"))],
                Json(body),
            )
                .into_response()
        }
        "aulaToken.getAulaToken" => {
            Json(json!({"status": {"message": "OK"}, "data": "widget-token"})).into_response()
        }
        "calendar.getEventsByProfileIdsAndResourceIds" => {
            if expired {
                return Json(expiry_envelope()).into_response();
            }
            Json(json!({"status": {"message": "OK"}, "data": calendar_fixture()})).into_response()
        }
        "messaging.getThreads" => {
            if expired {
                return Json(expiry_envelope()).into_response();
            }
            Json(json!({"status": {"message": "OK"}, "data": {"threads": [
                {"id": "t1", "read": false, "subject": "Forældremøde"},
                {"id": "t2", "read": true, "subject": "Madplan"},
                {"id": "t3", "read": false, "subject": "Følsom"}
            ]}}))
            .into_response()
        }
        "messaging.getMessagesForThread" => {
            if expired {
                return Json(expiry_envelope()).into_response();
            }
            match params.get("threadId").map(String::as_str) {
                // Sensitive thread: forbidden until MitID step-up
                Some("t3") => Json(json!({"status": {"code": 403, "message": "ERROR"}}))
                    .into_response(),
                Some(thread_id) => Json(json!({"status": {"message": "OK"}, "data": {
                    "subject": "Forældremøde",
                    "messages": [{
                        "id": format!("{thread_id}-m1"),
                        "messageType": "Message",
                        "sendDateTime": "2024-01-10T12:00:00+01:00",
                        "text": {"html": "<p>Husk mødet <b>torsdag</b></p>"},
                        "sender": {"fullName": "Lærer Hansen"}
                    }]
                }}))
                .into_response(),
                None => Json(json!({"status": {"code": 400}})).into_response(),
            }
        }
        "presence.getDailyOverview" => {
            if expired {
                return Json(expiry_envelope()).into_response();
            }
            let today = Local::now().date_naive();
            match params.get("childIds[]").map(String::as_str) {
                Some("child-1") => Json(json!({"status": {"message": "OK"}, "data": [{
                    "date": today.format("%Y-%m-%d").to_string(),
                    "status": 3,
                    "checkInTime": "08:02:00"
                }]}))
                .into_response(),
                // No presence data for the other children
                _ => Json(json!({"status": {"message": "OK"}, "data": []})).into_response(),
            }
        }
        "gallery.getAlbums" => {
            if expired {
                return Json(expiry_envelope()).into_response();
            }
            Json(json!({"status": {"message": "OK"}, "data": [
                {"id": "a1", "title": "Skovtur", "institutionName": "Nordskolen"}
            ]}))
            .into_response()
        }
        "gallery.getAlbum" => {
            Json(json!({"status": {"message": "OK"}, "data": {"pictures": [{
                "id": "p1", "title": "Bålet",
                "thumbnailUrl": "https://example.invalid/p1.jpg",
                "created": "2024-01-12T10:00:00+01:00"
            }]}}))
            .into_response()
        }
        _ => Json(json!({"status": {"code": 400, "message": "unknown method"}})).into_response(),
    }
}

/// The envelope the platform answers with when a session has expired
fn expiry_envelope() -> Value {
    json!({"status": {"code": 403, "message": "ERROR"}})
}

/// Two fixed January-2024 events plus two relative to today, so both the
/// date-range and the days-window queries have something to find (and
/// something to exclude)
fn calendar_fixture() -> Value {
    let today = Local::now().date_naive();
    let tomorrow_9 = Local
        .from_local_datetime(
            &today
                .checked_add_days(Days::new(1))
                .expect("tomorrow")
                .and_time(NaiveTime::from_hms_opt(9, 0, 0).expect("9am")),
        )
        .earliest()
        .expect("local tomorrow");
    let far_9 = Local
        .from_local_datetime(
            &today
                .checked_add_days(Days::new(20))
                .expect("far date")
                .and_time(NaiveTime::from_hms_opt(9, 0, 0).expect("9am")),
        )
        .earliest()
        .expect("local far date");

    json!([
        {
            "id": "fixture-1",
            "title": "Matematik",
            "type": "lesson",
            "startDateTime": "2024-01-02T09:00:00+01:00",
            "endDateTime": "2024-01-02T10:00:00+01:00",
            "belongsToProfiles": ["child-1"],
            "primaryResource": {"name": "lokale 2B"},
            "lesson": {"participants": [
                {"participantRole": "teacher", "teacherInitials": "MK"}
            ]}
        },
        {
            "id": "fixture-2",
            "title": "Idræt",
            "type": "lesson",
            "startDateTime": "2024-01-05T10:00:00+01:00",
            "endDateTime": "2024-01-05T11:00:00+01:00",
            "belongsToProfiles": ["child-1"]
        },
        {
            "id": "dynamic-near",
            "title": "Svømning",
            "type": "lesson",
            "startDateTime": tomorrow_9.to_rfc3339(),
            "endDateTime": (tomorrow_9 + chrono::Duration::hours(1)).to_rfc3339(),
            "belongsToProfiles": ["child-1"]
        },
        {
            "id": "dynamic-far",
            "title": "Lejrskole",
            "type": "lesson",
            "startDateTime": far_9.to_rfc3339(),
            "endDateTime": (far_9 + chrono::Duration::hours(2)).to_rfc3339(),
            "belongsToProfiles": ["child-1"]
        }
    ])
}

async fn weekly_plan(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !has_bearer(&headers) {
        return (axum::http::StatusCode::UNAUTHORIZED, "no token").into_response();
    }
    let week = params.get("tidspunkt").cloned().unwrap_or_default();
    Json(json!({"ugebreve": [{"uge": week, "indhold": "<p>Emneuge om rummet</p>"}]}))
        .into_response()
}

async fn homework(Query(_): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    if !has_bearer(&headers) {
        return (axum::http::StatusCode::UNAUTHORIZED, "no token").into_response();
    }
    let today = Local::now().date_naive();
    let due = Local
        .from_local_datetime(
            &today
                .checked_add_days(Days::new(1))
                .expect("tomorrow")
                .and_time(NaiveTime::from_hms_opt(8, 0, 0).expect("8am")),
        )
        .earliest()
        .expect("local due");
    Json(json!({"opgaver": [
        {"titel": "Læs kapitel 4", "afleveringsdato": due.to_rfc3339()}
    ]}))
    .into_response()
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Bearer "))
        .unwrap_or(false)
}
