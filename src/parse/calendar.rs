// src/parse/calendar.rs
// Calendar normalizers: primary schedule + supplementary plan sources

use super::{Parsed, html_to_text, parse_timestamp, str_field};
use crate::error::{AulaError, Result};
use crate::model::{CalendarEvent, EventSource};
use crate::utils::truncate;
use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Weekday};
use serde_json::Value;

/// Max summary length taken from a weekly-plan body
const PLAN_SUMMARY_CHARS: usize = 120;

/// Parse the `data` array of `calendar.getEventsByProfileIdsAndResourceIds`.
///
/// One malformed event (missing id/title, bad or inverted timestamps) drops
/// that event with a warning; only a missing container fails the batch.
pub fn parse_schedule_events(data: &Value, child_id: &str) -> Result<Parsed<CalendarEvent>> {
    let raw_events = data
        .as_array()
        .ok_or_else(|| AulaError::Parse("calendar response is not an array".to_string()))?;

    let mut parsed = Parsed::new();
    for raw in raw_events {
        match parse_schedule_event(raw, child_id) {
            Ok(event) => parsed.push(event),
            Err(detail) => parsed.warn("calendar event", detail),
        }
    }
    Ok(parsed)
}

fn parse_schedule_event(raw: &Value, child_id: &str) -> std::result::Result<CalendarEvent, String> {
    let id = str_field(raw, "id").ok_or("missing id")?;
    let summary = str_field(raw, "title").ok_or("missing title")?;

    let start_raw = str_field(raw, "startDateTime").ok_or("missing startDateTime")?;
    let end_raw = str_field(raw, "endDateTime").ok_or("missing endDateTime")?;
    let start =
        parse_timestamp(&start_raw).ok_or_else(|| format!("bad startDateTime: {start_raw}"))?;
    let end = parse_timestamp(&end_raw).ok_or_else(|| format!("bad endDateTime: {end_raw}"))?;
    if start > end {
        return Err(format!("start after end: {start_raw} > {end_raw}"));
    }

    let location = raw
        .get("primaryResource")
        .and_then(|r| str_field(r, "name"));

    Ok(CalendarEvent {
        id,
        child_id: child_id.to_string(),
        start,
        end,
        summary,
        location,
        teacher: extract_teacher(raw),
        source: EventSource::Schedule,
    })
}

/// Teacher attribution from lesson participants: a substitute wins and is
/// marked `VIKAR:`, otherwise the first participant's initials or name.
fn extract_teacher(raw: &Value) -> Option<String> {
    let participants = raw
        .get("lesson")?
        .get("participants")?
        .as_array()
        .filter(|p| !p.is_empty())?;

    for participant in participants {
        if str_field(participant, "participantRole").as_deref() == Some("substituteTeacher") {
            let name = str_field(participant, "teacherName")?;
            return Some(format!("VIKAR: {name}"));
        }
    }

    let first = &participants[0];
    str_field(first, "teacherInitials").or_else(|| str_field(first, "teacherName"))
}

/// Parse a weekly-plan payload (`{"ugebreve": [{"uge", "indhold"}]}`) into
/// one all-day event on the Monday of each ISO week.
pub fn parse_weekly_plan(data: &Value, child_id: &str) -> Result<Parsed<CalendarEvent>> {
    let letters = data
        .get("ugebreve")
        .and_then(Value::as_array)
        .ok_or_else(|| AulaError::Parse("weekly plan response has no ugebreve array".to_string()))?;

    let mut parsed = Parsed::new();
    for raw in letters {
        let Some(week) = str_field(raw, "uge") else {
            parsed.warn("weekly plan", "missing uge field");
            continue;
        };
        let Some(monday) = monday_of_iso_week(&week) else {
            parsed.warn("weekly plan", format!("bad week designator: {week}"));
            continue;
        };
        let body = str_field(raw, "indhold").unwrap_or_default();
        let text = html_to_text(&body);
        if text.is_empty() {
            parsed.warn("weekly plan", format!("empty body for week {week}"));
            continue;
        }

        let Some(start) = local_midnight(monday) else {
            parsed.warn("weekly plan", format!("unrepresentable date for week {week}"));
            continue;
        };
        let Some(end) = monday
            .checked_add_days(Days::new(1))
            .and_then(local_midnight)
        else {
            parsed.warn("weekly plan", format!("unrepresentable date for week {week}"));
            continue;
        };

        parsed.push(CalendarEvent {
            id: format!("ugeplan-{week}"),
            child_id: child_id.to_string(),
            start,
            end,
            summary: truncate(&text, PLAN_SUMMARY_CHARS),
            location: None,
            teacher: None,
            source: EventSource::WeeklyPlan,
        });
    }
    Ok(parsed)
}

/// Parse a homework payload (`{"opgaver": [{"titel", "afleveringsdato"}]}`)
/// into zero-length events at the due time.
pub fn parse_homework_tasks(data: &Value, child_id: &str) -> Result<Parsed<CalendarEvent>> {
    let tasks = data
        .get("opgaver")
        .and_then(Value::as_array)
        .ok_or_else(|| AulaError::Parse("homework response has no opgaver array".to_string()))?;

    let mut parsed = Parsed::new();
    for (index, raw) in tasks.iter().enumerate() {
        let Some(title) = str_field(raw, "titel") else {
            parsed.warn("homework task", "missing titel");
            continue;
        };
        let Some(due_raw) = str_field(raw, "afleveringsdato") else {
            parsed.warn("homework task", format!("missing afleveringsdato: {title}"));
            continue;
        };
        let Some(due) = parse_timestamp(&due_raw) else {
            parsed.warn("homework task", format!("bad afleveringsdato: {due_raw}"));
            continue;
        };

        let id = str_field(raw, "id").unwrap_or_else(|| format!("opgave-{index}"));
        parsed.push(CalendarEvent {
            id,
            child_id: child_id.to_string(),
            start: due,
            end: due,
            summary: title,
            location: None,
            teacher: None,
            source: EventSource::Homework,
        });
    }
    Ok(parsed)
}

/// Monday of an ISO week designator like `2024-W02`
fn monday_of_iso_week(designator: &str) -> Option<NaiveDate> {
    let (year, week) = designator.split_once("-W")?;
    let year: i32 = year.parse().ok()?;
    let week: u32 = week.parse().ok()?;
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
}

fn local_midnight(date: NaiveDate) -> Option<chrono::DateTime<chrono::Local>> {
    chrono::Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
}
