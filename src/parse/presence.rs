// src/parse/presence.rs
// Daily-overview normalizer

use super::{Parsed, i64_field, str_field};
use crate::error::{AulaError, Result};
use crate::model::{PresenceRecord, PresenceStatus};
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

/// Parse the `data` array of `presence.getDailyOverview`.
///
/// An empty array is not an error: the platform reports nothing for days
/// without presence data, which the caller represents as `Unknown`.
pub fn parse_daily_overview(data: &Value, child_id: &str) -> Result<Parsed<PresenceRecord>> {
    let rows = data
        .as_array()
        .ok_or_else(|| AulaError::Parse("presence response is not an array".to_string()))?;

    let mut parsed = Parsed::new();
    for raw in rows {
        let Some(date) = str_field(raw, "date").and_then(|d| parse_date(&d)) else {
            parsed.warn("presence record", format!("missing or bad date: {raw}"));
            continue;
        };

        parsed.push(PresenceRecord {
            child_id: child_id.to_string(),
            date,
            check_in: str_field(raw, "checkInTime").and_then(|t| parse_time(&t)),
            check_out: str_field(raw, "checkOutTime").and_then(|t| parse_time(&t)),
            status: map_status(i64_field(raw, "status")),
        });
    }
    Ok(parsed)
}

/// Map the platform's numeric status codes onto the three-valued enum.
///
/// Codes 1-2 are reported-absent/sick; 3-8 cover the arrived-through-
/// checked-out lifecycle; 0 means not yet checked in, which is
/// indistinguishable from no information.
fn map_status(code: Option<i64>) -> PresenceStatus {
    match code {
        Some(1) | Some(2) => PresenceStatus::Absent,
        Some(3..=8) => PresenceStatus::Present,
        _ => PresenceStatus::Unknown,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Dates arrive either bare or as a full timestamp
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10)?.parse().ok())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .ok()
        .or_else(|| NaiveTime::parse_from_str(raw, "%H:%M").ok())
}
