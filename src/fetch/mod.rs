// src/fetch/mod.rs
// Resource fetchers: thin, stateless functions of (session, query) -> raw
// payload. All transport, auth and retry concerns live in the session
// manager; all shaping lives in the parsers.

pub mod calendar;
pub mod gallery;
pub mod messages;
pub mod presence;

use serde_json::Value;

/// Unwrap the platform envelope; a missing `data` member becomes Null and
/// fails later at the parser's container check
pub(crate) fn data_of(envelope: Value) -> Value {
    envelope
        .get("data")
        .cloned()
        .unwrap_or(Value::Null)
}
