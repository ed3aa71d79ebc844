// src/parse/mod.rs
// Tolerant normalizers: raw platform payloads -> typed entities
//
// Every parser follows the same shape: per-field extractors return Option,
// one aggregation step per record decides keep-vs-skip, and a skipped
// record becomes a warning instead of failing the batch. Only a payload
// whose overall container is missing/wrong fails the fetch.

pub mod calendar;
pub mod gallery;
pub mod messages;
pub mod presence;
pub mod profiles;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Non-fatal anomaly recorded while normalizing a batch
#[derive(Debug, Clone, Serialize)]
pub struct ParseWarning {
    /// What was being parsed (e.g. "calendar event")
    pub context: String,
    /// Why the record was skipped
    pub detail: String,
}

/// A normalized batch plus the warnings it accumulated
#[derive(Debug)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub warnings: Vec<ParseWarning>,
}

impl<T> Parsed<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    /// Record a skipped entry. Logged once here so parsers stay quiet.
    pub fn warn(&mut self, context: impl Into<String>, detail: impl Into<String>) {
        let context = context.into();
        let detail = detail.into();
        warn!(context = %context, detail = %detail, "Skipping malformed record");
        self.warnings.push(ParseWarning { context, detail });
    }
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a platform timestamp into the local timezone.
///
/// Expected format is ISO-8601 with offset; naive timestamps are treated
/// as UTC. Returns None on anything else - the caller decides whether that
/// drops the record.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().with_timezone(&Local));
    }
    None
}

/// Extract a string field, accepting numeric ids as strings (the platform
/// is inconsistent about this)
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn bool_field(value: &Value, key: &str) -> Option<bool> {
    value.get(key)?.as_bool()
}

pub(crate) fn i64_field(value: &Value, key: &str) -> Option<i64> {
    value.get(key)?.as_i64()
}

/// Flatten an HTML fragment to plain text with collapsed whitespace
pub fn html_to_text(html: &str) -> String {
    let fragment = scraper::Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");

    let mut result = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !result.is_empty() {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }
    result.trim_end().to_string()
}
