// src/model.rs
// Typed entities for normalized platform data

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A child attached to the authenticated guardian profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    pub institution_name: Option<String>,
}

/// Guardian profile as returned by the profile endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub children: Vec<Child>,
}

/// Which data source a calendar entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Primary school schedule
    Schedule,
    /// Supplementary weekly plan
    WeeklyPlan,
    /// Supplementary homework task
    Homework,
}

/// A single calendar entry for one child.
///
/// Invariant: `start <= end`; entries violating it are dropped at parse
/// time with a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub child_id: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub summary: String,
    pub location: Option<String>,
    pub teacher: Option<String>,
    pub source: EventSource,
}

/// A message from the platform inbox.
///
/// Sensitive threads require step-up authentication the client cannot
/// perform; they are represented with a fixed placeholder body and
/// `sensitive = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub sender: String,
    pub sent_at: Option<DateTime<Local>>,
    pub unread: bool,
    pub excerpt: String,
    pub sensitive: bool,
}

/// Presence status for a child on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Present,
    Absent,
    Unknown,
}

/// Daily presence record for one child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub child_id: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: PresenceStatus,
}

/// A picture from the institution gallery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    pub title: String,
    pub album: String,
    pub thumbnail_url: String,
    pub created: Option<DateTime<Local>>,
}

impl PresenceRecord {
    /// Record for a day the platform reported nothing about
    pub fn unknown(child_id: &str, date: NaiveDate) -> Self {
        Self {
            child_id: child_id.to_string(),
            date,
            check_in: None,
            check_out: None,
            status: PresenceStatus::Unknown,
        }
    }
}
