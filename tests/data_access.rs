// tests/data_access.rs
// Domain facade operations against the mock platform

mod common;

use aula::AulaError;
use aula::model::{EventSource, PresenceStatus};
use chrono::{Datelike, Days, Local, NaiveDate};
use common::MockPlatform;

#[tokio::test]
async fn children_lookup_and_not_found() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let children = manager.get_children().await.expect("children");
    assert_eq!(children.len(), 2);

    let alma = manager.get_child_by_id("child-1").await.expect("child-1");
    assert_eq!(alma.name, "Alma");

    let err = manager
        .get_child_by_id("child-99")
        .await
        .expect_err("unknown child");
    assert!(matches!(err, AulaError::NotFound(_)));
}

#[tokio::test]
async fn date_range_query_returns_fixture_window() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    let end = NaiveDate::from_ymd_opt(2024, 1, 7).expect("date");
    let batch = manager
        .get_events_for_date_range("child-1", start, end)
        .await
        .expect("range query");

    let schedule: Vec<_> = batch
        .events
        .iter()
        .filter(|e| e.source == EventSource::Schedule)
        .collect();
    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule[0].summary, "Matematik");
    assert_eq!(schedule[0].location.as_deref(), Some("lokale 2B"));
    assert_eq!(schedule[0].teacher.as_deref(), Some("MK"));
    assert_eq!(schedule[1].summary, "Idræt");

    // Both fixture starts lie inside [2024-01-01T00:00, 2024-01-08T00:00)
    let window_start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    let window_end = NaiveDate::from_ymd_opt(2024, 1, 8).expect("date");
    for event in &batch.events {
        assert!(event.start.date_naive() >= window_start);
        assert!(event.start.date_naive() < window_end);
    }
}

#[tokio::test]
async fn days_window_is_end_exclusive_from_today() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let batch = manager
        .get_calendar_events("child-1", 7)
        .await
        .expect("days query");

    let today = Local::now().date_naive();
    let end = today.checked_add_days(Days::new(7)).expect("window end");
    for event in &batch.events {
        assert!(event.start.date_naive() >= today, "event before window: {event:?}");
        assert!(event.start.date_naive() < end, "event after window: {event:?}");
    }

    let summaries: Vec<&str> = batch.events.iter().map(|e| e.summary.as_str()).collect();
    // Tomorrow's lesson is in; the 2024 fixtures and the +20d trip are out
    assert!(summaries.contains(&"Svømning"));
    assert!(!summaries.contains(&"Matematik"));
    assert!(!summaries.contains(&"Lejrskole"));
}

#[tokio::test]
async fn supplementary_sources_are_appended() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let batch = manager
        .get_calendar_events("child-1", 7)
        .await
        .expect("days query");

    assert!(
        batch
            .events
            .iter()
            .any(|e| e.source == EventSource::WeeklyPlan && e.summary == "Emneuge om rummet")
    );
    assert!(
        batch
            .events
            .iter()
            .any(|e| e.source == EventSource::Homework && e.summary == "Læs kapitel 4")
    );
}

#[tokio::test]
async fn disabled_sources_are_not_fetched() {
    let platform = MockPlatform::spawn().await;
    let mut config = platform.config();
    config.ugeplan = false;
    config.mu_opgaver = false;
    let manager = platform.manager_with_config(config);

    let batch = manager
        .get_calendar_events("child-1", 7)
        .await
        .expect("days query");

    assert!(batch.events.iter().all(|e| e.source == EventSource::Schedule));
    assert_eq!(platform.api_hits("aulaToken.getAulaToken"), 0);
}

#[tokio::test]
async fn invalid_range_fails_without_network() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let start = NaiveDate::from_ymd_opt(2024, 2, 1).expect("date");
    let end = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    let err = manager
        .get_events_for_date_range("child-1", start, end)
        .await
        .expect_err("inverted range");
    assert!(matches!(err, AulaError::InvalidRange(_)));

    let err = manager
        .get_calendar_events("child-1", 0)
        .await
        .expect_err("zero days");
    assert!(matches!(err, AulaError::InvalidRange(_)));

    // Validation happens before any network traffic, login included
    assert_eq!(platform.login_attempts(), 0);
    assert_eq!(
        platform.api_hits("calendar.getEventsByProfileIdsAndResourceIds"),
        0
    );
}

#[tokio::test]
async fn unread_count_matches_list_length() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let unread = manager.get_unread_messages().await.expect("messages");
    assert_eq!(unread.count, unread.messages.len());
    assert_eq!(unread.count, 2);
    assert!(unread.messages.iter().all(|m| m.unread));

    // The sensitive thread is represented, not dropped
    let sensitive: Vec<_> = unread.messages.iter().filter(|m| m.sensitive).collect();
    assert_eq!(sensitive.len(), 1);
    assert_eq!(sensitive[0].subject, "Følsom besked");
}

#[tokio::test]
async fn presence_maps_status_and_unknown_days() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let records = manager.get_presence_data("child-1").await.expect("presence");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, PresenceStatus::Present);
    assert!(records[0].check_in.is_some());

    // The platform has nothing for child-2 today
    let records = manager.get_presence_data("child-2").await.expect("presence");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, PresenceStatus::Unknown);
    assert_eq!(records[0].date, Local::now().date_naive());

    let err = manager
        .get_presence_data("child-99")
        .await
        .expect_err("unknown child");
    assert!(matches!(err, AulaError::NotFound(_)));
}

#[tokio::test]
async fn summary_is_cached_until_refreshed() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let summary = manager.get_summary(false).await.expect("summary");
    assert_eq!(summary.children.len(), 2);
    assert_eq!(summary.unread_count, 2);
    assert!(summary.calendar.contains_key("child-1"));
    assert_eq!(summary.presence["child-1"][0].status, PresenceStatus::Present);
    let hits_after_first = platform.api_hits("messaging.getThreads");

    // Served from the snapshot: no new thread fetch
    manager.get_summary(false).await.expect("cached summary");
    assert_eq!(platform.api_hits("messaging.getThreads"), hits_after_first);

    // A forced refresh rebuilds
    manager.refresh_data().await.expect("refresh");
    assert!(platform.api_hits("messaging.getThreads") > hits_after_first);
}

#[tokio::test]
async fn gallery_items_come_newest_first_and_bounded() {
    let platform = MockPlatform::spawn().await;
    let manager = platform.manager();

    let items = manager.get_gallery_items(3).await.expect("gallery");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Bålet");
    assert_eq!(items[0].album, "Skovtur");
    assert_eq!(items[0].created.map(|c| c.year()), Some(2024));
}
