// src/parse/messages.rs
// Message-thread normalizers

use super::{Parsed, bool_field, html_to_text, parse_timestamp, str_field};
use crate::error::{AulaError, Result};
use crate::model::Message;
use crate::utils::truncate;
use serde_json::Value;

/// Max excerpt length taken from a message body
const EXCERPT_CHARS: usize = 200;

/// Placeholder body for threads that require step-up authentication
pub const SENSITIVE_SUBJECT: &str = "Følsom besked";
pub const SENSITIVE_BODY: &str = "Log ind på Aula med MitID for at læse denne besked.";
pub const UNKNOWN_SENDER: &str = "Ukendt afsender";

/// One entry from the thread listing
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    pub id: String,
    pub unread: bool,
    pub subject: Option<String>,
}

/// Parse the `data` object of `messaging.getThreads`, most recent first.
pub fn parse_threads(data: &Value) -> Result<Parsed<ThreadSummary>> {
    let raw_threads = data
        .get("threads")
        .and_then(Value::as_array)
        .ok_or_else(|| AulaError::Parse("thread response has no threads array".to_string()))?;

    let mut parsed = Parsed::new();
    for raw in raw_threads {
        let Some(id) = str_field(raw, "id") else {
            parsed.warn("message thread", "missing id");
            continue;
        };
        parsed.push(ThreadSummary {
            id,
            // Missing read flag counts as read; only an explicit false is unread
            unread: !bool_field(raw, "read").unwrap_or(true),
            subject: str_field(raw, "subject"),
        });
    }
    Ok(parsed)
}

/// Parse the `data` object of `messaging.getMessagesForThread`, extracting
/// the most recent proper message of the thread.
///
/// Returns at most one record; anomalies inside candidate messages fall
/// back to partial extraction before being skipped outright.
pub fn parse_thread_message(data: &Value, thread: &ThreadSummary) -> Result<Parsed<Message>> {
    let raw_messages = data
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| AulaError::Parse("thread detail has no messages array".to_string()))?;

    let subject = str_field(data, "subject")
        .or_else(|| thread.subject.clone())
        .unwrap_or_default();

    let mut parsed = Parsed::new();
    for raw in raw_messages {
        if str_field(raw, "messageType").as_deref() != Some("Message") {
            continue;
        }

        let id = match str_field(raw, "id") {
            Some(id) => id,
            None => {
                parsed.warn("message", format!("missing id in thread {}", thread.id));
                continue;
            }
        };

        let sent_at = str_field(raw, "sendDateTime").and_then(|raw_ts| {
            let ts = parse_timestamp(&raw_ts);
            if ts.is_none() {
                parsed.warn("message", format!("bad sendDateTime: {raw_ts}"));
            }
            ts
        });

        let sender = raw
            .get("sender")
            .and_then(|s| str_field(s, "fullName"))
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

        parsed.push(Message {
            id,
            thread_id: thread.id.clone(),
            subject: subject.clone(),
            sender,
            sent_at,
            unread: thread.unread,
            excerpt: extract_body(raw),
            sensitive: false,
        });
        break;
    }
    Ok(parsed)
}

/// Placeholder for a thread the API refuses to open (per-thread 403)
pub fn sensitive_message(thread: &ThreadSummary) -> Message {
    Message {
        id: format!("sensitive-{}", thread.id),
        thread_id: thread.id.clone(),
        subject: SENSITIVE_SUBJECT.to_string(),
        sender: UNKNOWN_SENDER.to_string(),
        sent_at: None,
        unread: thread.unread,
        excerpt: SENSITIVE_BODY.to_string(),
        sensitive: true,
    }
}

/// Body text: `text` may be an `{html}` object or a bare string
fn extract_body(raw: &Value) -> String {
    let html = match raw.get("text") {
        Some(Value::Object(_)) => raw
            .get("text")
            .and_then(|t| str_field(t, "html"))
            .unwrap_or_default(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    truncate(&html_to_text(&html), EXCERPT_CHARS)
}
