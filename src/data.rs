// src/data.rs
// Domain facade: typed queries over fetched entities, plus the combined
// snapshot behind get_summary/refresh_data

use crate::config::AulaConfig;
use crate::error::{AulaError, Result};
use crate::fetch;
use crate::model::{CalendarEvent, Child, GalleryItem, Message, PresenceRecord};
use crate::parse::{self, ParseWarning};
use crate::session::SessionManager;
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveTime, TimeZone};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default calendar fetch window in days
pub const DEFAULT_CALENDAR_DAYS: i64 = 14;

/// Snapshot staleness window for get_summary
const SNAPSHOT_MAX_AGE_MINUTES: i64 = 15;

/// Threads examined per message fetch
const MAX_MESSAGE_THREADS: usize = 5;

/// Calendar events plus the warnings their normalization produced
#[derive(Debug, Serialize)]
pub struct EventBatch {
    pub events: Vec<CalendarEvent>,
    pub warnings: Vec<ParseWarning>,
}

/// Unread messages with the derived aggregate. The count is always the
/// length of `messages`; it is never stored separately.
#[derive(Debug, Serialize)]
pub struct UnreadMessages {
    pub count: usize,
    pub messages: Vec<Message>,
}

/// Combined snapshot served by get_summary
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub children: Vec<Child>,
    pub unread_count: usize,
    pub messages: Vec<Message>,
    pub presence: HashMap<String, Vec<PresenceRecord>>,
    pub calendar: HashMap<String, Vec<CalendarEvent>>,
    pub gallery: Vec<GalleryItem>,
    pub last_updated: DateTime<Local>,
}

/// Query/filter/format layer over the platform data. Owns the snapshot
/// cache; everything else is fetched per request through the session.
pub struct DataManager {
    session: Arc<SessionManager>,
    config: AulaConfig,
    snapshot: RwLock<Option<Summary>>,
}

impl DataManager {
    pub fn new(session: Arc<SessionManager>, config: AulaConfig) -> Self {
        Self {
            session,
            config,
            snapshot: RwLock::new(None),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Children of the authenticated profiles
    pub async fn get_children(&self) -> Result<Vec<Child>> {
        self.session.login().await?;
        Ok(self.session.children().await)
    }

    /// One child by id, or NotFound
    pub async fn get_child_by_id(&self, child_id: &str) -> Result<Child> {
        self.get_children()
            .await?
            .into_iter()
            .find(|c| c.id == child_id)
            .ok_or_else(|| AulaError::NotFound(format!("child {child_id}")))
    }

    /// Events for `[today, today+days)`, end-exclusive on the start
    /// timestamp. `days` must be positive; validated before any network
    /// traffic.
    pub async fn get_calendar_events(&self, child_id: &str, days: i64) -> Result<EventBatch> {
        if days <= 0 {
            return Err(AulaError::InvalidRange(format!(
                "days must be positive, got {days}"
            )));
        }
        let today = Local::now().date_naive();
        let end = today
            .checked_add_days(Days::new(days as u64))
            .ok_or_else(|| AulaError::InvalidRange(format!("window of {days} days overflows")))?;
        self.fetch_event_window(child_id, today, end).await
    }

    /// Events for `[start_date, end_date]`, both boundary dates inclusive.
    /// `start_date <= end_date` is validated before any network traffic.
    pub async fn get_events_for_date_range(
        &self,
        child_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<EventBatch> {
        if start_date > end_date {
            return Err(AulaError::InvalidRange(format!(
                "start {start_date} is after end {end_date}"
            )));
        }
        // Inclusive end date, so the half-open window ends the day after
        let end = end_date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AulaError::InvalidRange("end date overflows".to_string()))?;
        self.fetch_event_window(child_id, start_date, end).await
    }

    /// Fetch, normalize and merge all enabled calendar sources for one
    /// child over `[start, end)`. Supplementary entries are appended after
    /// primary ones, never deduplicated against them.
    async fn fetch_event_window(
        &self,
        child_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<EventBatch> {
        let window_start = start_of_day(start);
        let window_end = start_of_day(end);
        self.session.login().await?;
        // Supplements address the child by user id where the primary
        // calendar uses the profile id
        let user_id = self
            .session
            .children()
            .await
            .into_iter()
            .find(|c| c.id == child_id)
            .map(|c| c.user_id)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| child_id.to_string());

        let mut events = Vec::new();
        let mut warnings = Vec::new();

        if self.config.schoolschedule {
            let data = fetch::calendar::fetch_schedule(
                &self.session,
                child_id,
                window_start,
                window_end,
            )
            .await?;
            let parsed = parse::calendar::parse_schedule_events(&data, child_id)?;
            events.extend(parsed.records);
            warnings.extend(parsed.warnings);
        }

        // Supplementary sources are best-effort: their API is separate
        // from the session's and flakes independently, so a failure
        // degrades to a warning instead of losing the primary schedule.
        if self.config.ugeplan {
            for week in iso_weeks_in(start, end) {
                match fetch::calendar::fetch_weekly_plan(&self.session, &user_id, &week).await {
                    Ok(data) => match parse::calendar::parse_weekly_plan(&data, child_id) {
                        Ok(parsed) => {
                            events.extend(parsed.records);
                            warnings.extend(parsed.warnings);
                        }
                        Err(e) => warnings.push(supplement_warning("weekly plan", &e)),
                    },
                    Err(e) => warnings.push(supplement_warning("weekly plan", &e)),
                }
            }
        }

        if self.config.mu_opgaver {
            match fetch::calendar::fetch_homework(&self.session, &user_id).await {
                Ok(data) => match parse::calendar::parse_homework_tasks(&data, child_id) {
                    Ok(parsed) => {
                        events.extend(parsed.records);
                        warnings.extend(parsed.warnings);
                    }
                    Err(e) => warnings.push(supplement_warning("homework", &e)),
                },
                Err(e) => warnings.push(supplement_warning("homework", &e)),
            }
        }

        let mut events: Vec<CalendarEvent> = events
            .into_iter()
            .filter(|e| e.start >= window_start && e.start < window_end)
            .collect();
        events.sort_by_key(|e| e.start);

        debug!(
            child_id,
            events = events.len(),
            warnings = warnings.len(),
            "Calendar window assembled"
        );
        Ok(EventBatch { events, warnings })
    }

    /// Unread messages, most recent first. Count equals the list length.
    pub async fn get_unread_messages(&self) -> Result<UnreadMessages> {
        let (messages, _warnings) = self.fetch_recent_messages().await?;
        let unread: Vec<Message> = messages.into_iter().filter(|m| m.unread).collect();
        Ok(UnreadMessages {
            count: unread.len(),
            messages: unread,
        })
    }

    /// Recent messages across the newest threads, read or not
    async fn fetch_recent_messages(&self) -> Result<(Vec<Message>, Vec<ParseWarning>)> {
        let data = fetch::messages::fetch_threads(&self.session).await?;
        let threads = parse::messages::parse_threads(&data)?;
        let mut warnings = threads.warnings;

        let mut messages = Vec::new();
        for thread in threads.records.iter().take(MAX_MESSAGE_THREADS) {
            match fetch::messages::fetch_thread_messages(&self.session, &thread.id).await? {
                None => messages.push(parse::messages::sensitive_message(thread)),
                Some(detail) => {
                    let parsed = parse::messages::parse_thread_message(&detail, thread)?;
                    messages.extend(parsed.records);
                    warnings.extend(parsed.warnings);
                }
            }
        }
        Ok((messages, warnings))
    }

    /// Presence records for one child; a day the platform reports nothing
    /// about becomes a single Unknown record. Unknown child ids are
    /// NotFound.
    pub async fn get_presence_data(&self, child_id: &str) -> Result<Vec<PresenceRecord>> {
        let child = self.get_child_by_id(child_id).await?;
        let data = fetch::presence::fetch_daily_overview(&self.session, &child.id).await?;
        let parsed = parse::presence::parse_daily_overview(&data, &child.id)?;

        if parsed.records.is_empty() {
            return Ok(vec![PresenceRecord::unknown(
                &child.id,
                Local::now().date_naive(),
            )]);
        }
        Ok(parsed.records)
    }

    /// Newest gallery items, bounded by `limit`
    pub async fn get_gallery_items(&self, limit: usize) -> Result<Vec<GalleryItem>> {
        let summary = self.summary_snapshot(false).await?;
        Ok(summary.gallery.into_iter().take(limit).collect())
    }

    /// Force-rebuild the snapshot
    pub async fn refresh_data(&self) -> Result<()> {
        self.summary_snapshot(true).await.map(|_| ())
    }

    /// Combined summary; cached and rebuilt only when forced or older than
    /// the staleness window
    pub async fn get_summary(&self, force_update: bool) -> Result<Summary> {
        self.summary_snapshot(force_update).await
    }

    async fn summary_snapshot(&self, force: bool) -> Result<Summary> {
        if !force
            && let Some(snapshot) = self.snapshot.read().await.as_ref()
            && Local::now() - snapshot.last_updated
                < chrono::Duration::minutes(SNAPSHOT_MAX_AGE_MINUTES)
        {
            debug!("Serving cached summary snapshot");
            return Ok(snapshot.clone());
        }

        // Re-check under the write lock; a concurrent caller may have just
        // rebuilt it
        let mut slot = self.snapshot.write().await;
        if !force
            && let Some(snapshot) = slot.as_ref()
            && Local::now() - snapshot.last_updated
                < chrono::Duration::minutes(SNAPSHOT_MAX_AGE_MINUTES)
        {
            return Ok(snapshot.clone());
        }

        let summary = self.build_summary().await?;
        *slot = Some(summary.clone());
        Ok(summary)
    }

    async fn build_summary(&self) -> Result<Summary> {
        info!("Building data snapshot");
        let children = self.get_children().await?;

        // Presence fans out per child; one slow child should not serialize
        // the others
        let presence_results = join_all(
            children
                .iter()
                .map(|child| self.get_presence_data(&child.id)),
        )
        .await;
        let mut presence = HashMap::new();
        for (child, result) in children.iter().zip(presence_results) {
            presence.insert(child.id.clone(), result?);
        }

        let mut calendar = HashMap::new();
        for child in &children {
            let batch = self
                .get_calendar_events(&child.id, DEFAULT_CALENDAR_DAYS)
                .await?;
            calendar.insert(child.id.clone(), batch.events);
        }

        let (messages, _warnings) = self.fetch_recent_messages().await?;
        let unread_count = messages.iter().filter(|m| m.unread).count();

        let gallery = self.fetch_gallery(&children).await;

        Ok(Summary {
            children,
            unread_count,
            messages,
            presence,
            calendar,
            gallery,
            last_updated: Local::now(),
        })
    }

    /// Gallery is decoration on top of the summary; failures degrade to a
    /// log line instead of failing the snapshot
    async fn fetch_gallery(&self, children: &[Child]) -> Vec<GalleryItem> {
        let profile_ids: Vec<String> = children.iter().map(|c| c.id.clone()).collect();
        if profile_ids.is_empty() {
            return Vec::new();
        }

        let mut items = Vec::new();
        match fetch::gallery::fetch_albums(&self.session, &profile_ids).await {
            Ok(data) => match parse::gallery::parse_albums(&data) {
                Ok(albums) => {
                    for album in &albums.records {
                        match fetch::gallery::fetch_album(&self.session, &album.id).await {
                            Ok(detail) => {
                                if let Ok(parsed) =
                                    parse::gallery::parse_album_pictures(&detail, album)
                                {
                                    items.extend(parsed.records);
                                }
                            }
                            Err(e) => warn!(album = %album.id, error = %e, "Album fetch failed"),
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Album listing unparseable"),
            },
            Err(e) => warn!(error = %e, "Gallery fetch failed"),
        }

        items.sort_by(|a, b| b.created.cmp(&a.created));
        items
    }
}

/// Group events by their local start date, days in order
pub fn group_events_by_day(events: &[CalendarEvent]) -> BTreeMap<NaiveDate, Vec<CalendarEvent>> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for event in events {
        days.entry(event.start.date_naive())
            .or_default()
            .push(event.clone());
    }
    days
}

/// One human-readable line per event, e.g.
/// `08:00-09:30 Matematik (lokale 2B) [MK]`
pub fn format_event_line(event: &CalendarEvent) -> String {
    let mut line = format!(
        "{}-{} {}",
        event.start.format("%H:%M"),
        event.end.format("%H:%M"),
        event.summary
    );
    if let Some(location) = &event.location {
        line.push_str(&format!(" ({location})"));
    }
    if let Some(teacher) = &event.teacher {
        line.push_str(&format!(" [{teacher}]"));
    }
    line
}

fn supplement_warning(context: &str, error: &AulaError) -> ParseWarning {
    warn!(context, error = %error, "Supplementary source unavailable");
    ParseWarning {
        context: context.to_string(),
        detail: error.to_string(),
    }
}

/// Local midnight for a date; on transition days the earliest valid
/// instant wins
fn start_of_day(date: NaiveDate) -> DateTime<Local> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .unwrap_or_else(Local::now)
}

/// ISO week designators (`2024-W02`) touched by `[start, end)`
fn iso_weeks_in(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    let mut weeks = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let iso = cursor.iso_week();
        let designator = format!("{}-W{:02}", iso.year(), iso.week());
        if weeks.last() != Some(&designator) {
            weeks.push(designator);
        }
        match cursor.checked_add_days(Days::new(7)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    // The 7-day stride can step over the final partial week
    if end > start {
        let last = end.pred_opt().unwrap_or(start).iso_week();
        let designator = format!("{}-W{:02}", last.year(), last.week());
        if weeks.last() != Some(&designator) {
            weeks.push(designator);
        }
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventSource;

    fn event(id: &str, start: DateTime<Local>, end: DateTime<Local>) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            child_id: "child-1".to_string(),
            start,
            end,
            summary: "Matematik".to_string(),
            location: None,
            teacher: None,
            source: EventSource::Schedule,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_group_events_by_day() {
        let events = vec![
            event("a", at(2024, 1, 15, 8, 0), at(2024, 1, 15, 9, 0)),
            event("b", at(2024, 1, 16, 8, 0), at(2024, 1, 16, 9, 0)),
            event("c", at(2024, 1, 15, 10, 0), at(2024, 1, 15, 11, 0)),
        ];

        let days = group_events_by_day(&events);
        assert_eq!(days.len(), 2);
        let jan15 = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(days[&jan15].len(), 2);
    }

    #[test]
    fn test_format_event_line() {
        let mut e = event("a", at(2024, 1, 15, 8, 0), at(2024, 1, 15, 9, 30));
        e.location = Some("lokale 2B".to_string());
        e.teacher = Some("MK".to_string());
        assert_eq!(format_event_line(&e), "08:00-09:30 Matematik (lokale 2B) [MK]");
    }

    #[test]
    fn test_format_event_line_bare() {
        let e = event("a", at(2024, 1, 15, 8, 0), at(2024, 1, 15, 9, 0));
        assert_eq!(format_event_line(&e), "08:00-09:00 Matematik");
    }

    #[test]
    fn test_iso_weeks_in_single_week() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 18).unwrap();
        assert_eq!(iso_weeks_in(start, end), vec!["2024-W03"]);
    }

    #[test]
    fn test_iso_weeks_in_spanning_weeks() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 29).unwrap();
        assert_eq!(iso_weeks_in(start, end), vec!["2024-W03", "2024-W04"]);
    }

    #[test]
    fn test_iso_weeks_in_empty_window() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert!(iso_weeks_in(day, day).is_empty());
    }

    #[test]
    fn test_iso_weeks_covers_partial_tail_week() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let weeks = iso_weeks_in(start, end);
        assert_eq!(weeks, vec!["2024-W03", "2024-W04", "2024-W05"]);
    }
}
