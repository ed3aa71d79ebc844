// src/fetch/calendar.rs
// Calendar fetchers: primary schedule + MinUddannelse supplements

use super::data_of;
use crate::error::Result;
use crate::session::SessionManager;
use chrono::{DateTime, Local};
use serde_json::{Value, json};

/// Widget id granting access to the MinUddannelse weekly plan
const WEEKLY_PLAN_WIDGET_ID: &str = "0004";

/// Widget id granting access to MinUddannelse homework tasks
const HOMEWORK_WIDGET_ID: &str = "0030";

/// Primary schedule for one child over a date window.
///
/// The platform wants the window as date-at-midnight strings with an
/// offset; only the date part is honored.
pub async fn fetch_schedule(
    session: &SessionManager,
    child_id: &str,
    start: DateTime<Local>,
    end: DateTime<Local>,
) -> Result<Value> {
    let body = json!({
        "instProfileIds": [child_id],
        "resourceIds": [],
        "start": format_window_bound(start),
        "end": format_window_bound(end),
    });
    let envelope = session
        .api_post("calendar.getEventsByProfileIdsAndResourceIds", &[], body)
        .await?;
    Ok(data_of(envelope))
}

/// Weekly plan for one child and one ISO week (e.g. `2024-W02`)
pub async fn fetch_weekly_plan(
    session: &SessionManager,
    child_user_id: &str,
    week: &str,
) -> Result<Value> {
    let url = format!("{}/ugebreve", session.urls().min_uddannelse_api);
    session
        .widget_get(
            &url,
            WEEKLY_PLAN_WIDGET_ID,
            &[("elevId", child_user_id), ("tidspunkt", week)],
        )
        .await
}

/// Open homework tasks for one child
pub async fn fetch_homework(session: &SessionManager, child_user_id: &str) -> Result<Value> {
    let url = format!("{}/opgaver", session.urls().min_uddannelse_api);
    session
        .widget_get(&url, HOMEWORK_WIDGET_ID, &[("elevId", child_user_id)])
        .await
}

fn format_window_bound(bound: DateTime<Local>) -> String {
    bound.format("%Y-%m-%d 00:00:00.0000%z").to_string()
}
