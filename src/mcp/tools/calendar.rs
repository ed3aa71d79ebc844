// src/mcp/tools/calendar.rs
// Calendar tools

use crate::data::DEFAULT_CALENDAR_DAYS;
use crate::error::AulaError;
use crate::mcp::AulaServer;
use crate::utils::ResultExt;
use chrono::{Days, Local, NaiveDate};

pub async fn get_calendar_events(
    server: &AulaServer,
    child_id: String,
    days: Option<i64>,
) -> Result<String, String> {
    let batch = server
        .data
        .get_calendar_events(&child_id, days.unwrap_or(DEFAULT_CALENDAR_DAYS))
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string_pretty(&batch).str_err()
}

pub async fn get_events_for_date_range(
    server: &AulaServer,
    child_id: String,
    start_date: Option<String>,
    end_date: Option<String>,
    days: Option<i64>,
) -> Result<String, String> {
    let start = match start_date {
        Some(raw) => parse_date("start_date", &raw)?,
        None => Local::now().date_naive(),
    };
    let end = match end_date {
        Some(raw) => parse_date("end_date", &raw)?,
        None => {
            // No end date: fall back to a days-long window, end-inclusive
            let days = days.unwrap_or(DEFAULT_CALENDAR_DAYS);
            if days <= 0 {
                return Err(AulaError::InvalidRange(format!(
                    "days must be positive, got {days}"
                ))
                .to_user_string());
            }
            start
                .checked_add_days(Days::new((days - 1) as u64))
                .ok_or_else(|| {
                    AulaError::InvalidRange(format!("window of {days} days overflows"))
                        .to_user_string()
                })?
        }
    };

    let batch = server
        .data
        .get_events_for_date_range(&child_id, start, end)
        .await
        .map_err(|e| e.to_user_string())?;
    serde_json::to_string_pretty(&batch).str_err()
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AulaError::InvalidRange(format!("bad {field}: {raw}")).to_user_string())
}
