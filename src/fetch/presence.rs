// src/fetch/presence.rs
// Presence fetcher

use super::data_of;
use crate::error::Result;
use crate::session::SessionManager;
use serde_json::Value;

/// Daily presence overview for one child
pub async fn fetch_daily_overview(session: &SessionManager, child_id: &str) -> Result<Value> {
    let envelope = session
        .api_get("presence.getDailyOverview", &[("childIds[]", child_id)])
        .await?;
    Ok(data_of(envelope))
}
