//! End-to-end check cycle tests: in-memory database, mock transport
//!
//! Exercises the save → seed/detect → broadcast → cursor-advance pipeline
//! without touching the network.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use fanpulse::broadcast::{BroadcastDispatcher, MessageTransport, PhotoPayload};
use fanpulse::checker;
use fanpulse::config::Config;
use fanpulse::db::stats::ExtraStats;
use fanpulse::db::{self, init::create_schema};
use fanpulse::fetchers::FetchedStats;
use fanpulse::platform::Platform;
use fanpulse::{AppState, Error, Result};

/// Transport that records every send and fails for a configurable set of
/// recipients
#[derive(Default)]
struct MockTransport {
    fail_for: Mutex<HashSet<i64>>,
    sent: Mutex<Vec<(i64, String)>>,
}

impl MockTransport {
    fn fail_all(&self, ids: &[i64]) {
        let mut fail_for = self.fail_for.lock().unwrap();
        fail_for.clear();
        fail_for.extend(ids);
    }

    fn sent_messages(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.fail_for.lock().unwrap().contains(&chat_id) {
            return Err(Error::Transport("unreachable".to_string()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, _photo: &PhotoPayload, caption: &str) -> Result<()> {
        self.send_text(chat_id, caption).await
    }
}

async fn setup(subscribers: &[i64]) -> (AppState, Arc<MockTransport>) {
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();

    for id in subscribers {
        sqlx::query("INSERT INTO subscribers (chat_id) VALUES (?)")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }

    let transport = Arc::new(MockTransport::default());
    let dispatcher = BroadcastDispatcher::new(transport.clone());

    let config = Config {
        history_min_interval_secs: 0, // no throttle in tests
        ..Config::default()
    };

    let state = AppState::new(pool, reqwest::Client::new(), config, dispatcher);
    (state, transport)
}

fn observed(platform: Platform, count: u64) -> FetchedStats {
    FetchedStats {
        platform,
        count,
        extra: ExtraStats::default(),
    }
}

#[tokio::test]
async fn first_observation_seeds_cursor_without_notifying() {
    let (state, transport) = setup(&[1, 2]).await;

    let report = checker::process(&state, vec![observed(Platform::YouTube, 23_500)]).await;

    assert_eq!(report.checked, 1);
    assert!(report.notifications.is_empty());
    assert!(transport.sent_messages().is_empty());

    // Cursor seeded to the highest threshold already passed
    let last = db::milestones::get_last(&state.db, Platform::YouTube)
        .await
        .unwrap();
    assert_eq!(last, Some(20_000));

    // Bootstrap is visible in the audit log as an unnotified record
    let history = db::milestones::get_milestone_history(&state.db, Platform::YouTube)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].notified);

    // Stats were saved
    let current = db::stats::get_current(&state.db, Platform::YouTube)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.count, 23_500);
}

#[tokio::test]
async fn first_observation_below_all_thresholds_leaves_cursor_unset() {
    let (state, _) = setup(&[1]).await;

    checker::process(&state, vec![observed(Platform::Instagram, 500)]).await;

    let last = db::milestones::get_last(&state.db, Platform::Instagram)
        .await
        .unwrap();
    assert_eq!(last, None);
}

#[tokio::test]
async fn crossing_a_threshold_notifies_every_subscriber_once() {
    let (state, transport) = setup(&[1, 2, 3]).await;

    // Seed cycle, then a cycle that crosses 25K without observing it exactly
    checker::process(&state, vec![observed(Platform::Telegram, 23_500)]).await;
    let report = checker::process(&state, vec![observed(Platform::Telegram, 26_100)]).await;

    assert_eq!(report.notifications.len(), 1);
    let outcome = &report.notifications[0];
    assert_eq!(outcome.platform, Platform::Telegram);
    assert_eq!(outcome.value, 25_000);
    assert_eq!(outcome.milestone, "25K");
    assert_eq!(outcome.delivered, 3);

    let sent = transport.sent_messages();
    assert_eq!(sent.len(), 3);
    assert!(sent[0].1.contains("25K"));
    assert!(sent[0].1.contains("Telegram"));

    assert_eq!(
        db::milestones::get_last(&state.db, Platform::Telegram).await.unwrap(),
        Some(25_000)
    );

    // Idempotent re-check: same count again, no second notification
    let repeat = checker::process(&state, vec![observed(Platform::Telegram, 26_100)]).await;
    assert!(repeat.notifications.is_empty());
    assert_eq!(transport.sent_messages().len(), 3);
}

#[tokio::test]
async fn partial_delivery_failure_still_advances_cursor() {
    let (state, transport) = setup(&[1, 2, 3]).await;
    checker::process(&state, vec![observed(Platform::YouTube, 9_500)]).await;

    transport.fail_all(&[2]);
    let report = checker::process(&state, vec![observed(Platform::YouTube, 10_000)]).await;

    assert_eq!(report.notifications.len(), 1);
    assert_eq!(report.notifications[0].delivered, 2);
    assert_eq!(report.notifications[0].total, 3);

    // successful > 0, so the cursor advanced
    assert_eq!(
        db::milestones::get_last(&state.db, Platform::YouTube).await.unwrap(),
        Some(10_000)
    );
}

#[tokio::test]
async fn zero_deliveries_withholds_cursor_and_retries_next_cycle() {
    let (state, transport) = setup(&[1, 2]).await;
    checker::process(&state, vec![observed(Platform::YouTube, 9_500)]).await;

    // Every send fails: cursor must not advance
    transport.fail_all(&[1, 2]);
    let report = checker::process(&state, vec![observed(Platform::YouTube, 10_000)]).await;
    assert!(report.notifications.is_empty());
    assert_eq!(
        db::milestones::get_last(&state.db, Platform::YouTube).await.unwrap(),
        Some(9_000)
    );

    // Transport recovers: the identical cycle attempts the same threshold
    transport.fail_all(&[]);
    let retry = checker::process(&state, vec![observed(Platform::YouTube, 10_000)]).await;
    assert_eq!(retry.notifications.len(), 1);
    assert_eq!(retry.notifications[0].value, 10_000);
    assert_eq!(
        db::milestones::get_last(&state.db, Platform::YouTube).await.unwrap(),
        Some(10_000)
    );
}

#[tokio::test]
async fn absent_fetch_skips_save_and_detection() {
    let (state, transport) = setup(&[1]).await;

    let report = checker::process(&state, Vec::new()).await;

    assert_eq!(report.checked, 0);
    assert!(report.stats.is_empty());
    assert!(transport.sent_messages().is_empty());
    assert!(db::stats::get_current(&state.db, Platform::YouTube)
        .await
        .unwrap()
        .is_none());
    let history = db::stats::get_history(&state.db, Platform::YouTube, 0, i64::MAX)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn one_platform_failure_never_blocks_the_others() {
    let (state, _) = setup(&[1]).await;

    // Only two of three platforms fetched this cycle
    let report = checker::process(
        &state,
        vec![
            observed(Platform::YouTube, 5_000),
            observed(Platform::Instagram, 800),
        ],
    )
    .await;

    assert_eq!(report.checked, 2);
    assert!(db::stats::get_current(&state.db, Platform::YouTube)
        .await
        .unwrap()
        .is_some());
    assert!(db::stats::get_current(&state.db, Platform::Instagram)
        .await
        .unwrap()
        .is_some());
    assert!(db::stats::get_current(&state.db, Platform::Telegram)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn health_reports_subscriber_count() {
    let (state, _) = setup(&[1, 2, 3]).await;

    let response = fanpulse::api::health_check(axum::extract::State(state))
        .await
        .unwrap();
    assert_eq!(response.0.status, "ok");
    assert_eq!(response.0.subscribers, 3);
}

#[tokio::test]
async fn repeated_cycles_accumulate_history() {
    let (state, _) = setup(&[]).await;

    checker::process(&state, vec![observed(Platform::Telegram, 1_100)]).await;
    checker::process(&state, vec![observed(Platform::Telegram, 1_150)]).await;

    let history = db::stats::get_history(&state.db, Platform::Telegram, 0, i64::MAX)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].count, 1_100);
    assert_eq!(history[1].count, 1_150);
}
