// src/fetch/messages.rs
// Message fetchers

use super::data_of;
use crate::error::Result;
use crate::session::SessionManager;
use serde_json::Value;

/// Thread listing, most recent first
pub async fn fetch_threads(session: &SessionManager) -> Result<Value> {
    let envelope = session
        .api_get(
            "messaging.getThreads",
            &[("sortOn", "date"), ("orderDirection", "desc"), ("page", "0")],
        )
        .await?;
    Ok(data_of(envelope))
}

/// Messages of one thread. None means the thread is sensitive (requires
/// step-up authentication the client cannot perform).
pub async fn fetch_thread_messages(
    session: &SessionManager,
    thread_id: &str,
) -> Result<Option<Value>> {
    let envelope = session
        .api_get_guarded(
            "messaging.getMessagesForThread",
            &[("threadId", thread_id), ("page", "0")],
        )
        .await?;
    Ok(envelope.map(data_of))
}
