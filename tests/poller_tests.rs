// Poller tests: publish on tick, failure state, daily snapshot, owned stop handle

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::{FailingSheetSource, StaticSheetSource, active, record_set, sample_csv};
use dealerboard::models::{Provenance, SnapshotKind, Totals};
use dealerboard::poller::{
    AppStats, FeedState, LiveData, PollerConfig, PollerDeps, ensure_daily_snapshot, refresh,
    start,
};
use dealerboard::snapshot_repo::{InMemorySnapshotStore, SnapshotStore};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::watch;

fn config(daily_snapshot: bool) -> PollerConfig {
    PollerConfig {
        interval: Duration::from_secs(3600),
        daily_snapshot,
        stats_log_interval: Duration::from_secs(3600),
    }
}

#[tokio::test]
async fn poller_publishes_records_and_stops() {
    let source = StaticSheetSource::new(sample_csv());
    let store = InMemorySnapshotStore::new();
    let stats = Arc::new(AppStats::default());
    let (state_tx, mut state_rx) = watch::channel(FeedState::default());
    assert!(state_rx.borrow().ready().is_none());

    let handle = start(
        PollerDeps {
            source: Arc::new(source.clone()),
            store: Arc::new(store.clone()),
            state_tx,
            stats: stats.clone(),
        },
        config(false),
    );

    state_rx.changed().await.unwrap();
    let live = state_rx.borrow().ready().expect("ready after first tick");
    assert_eq!(live.records.active.len(), 3);
    assert_eq!(live.records.expired.len(), 3);

    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .expect("poller stops promptly");

    assert_eq!(stats.refresh_ok.load(Ordering::Relaxed), 1);
    assert_eq!(source.fetch_count(), 1);
    // daily snapshots are off
    assert!(store.list(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn poller_publishes_failure_state() {
    let stats = Arc::new(AppStats::default());
    let (state_tx, mut state_rx) = watch::channel(FeedState::default());
    let handle = start(
        PollerDeps {
            source: Arc::new(FailingSheetSource),
            store: Arc::new(InMemorySnapshotStore::new()),
            state_tx,
            stats: stats.clone(),
        },
        config(true),
    );

    state_rx.changed().await.unwrap();
    match &*state_rx.borrow() {
        FeedState::Failed { message, .. } => assert!(message.contains("HTTP 503")),
        other => panic!("expected failure state, got {other:?}"),
    }
    handle.stop().await;
    assert_eq!(stats.refresh_failed.load(Ordering::Relaxed), 1);
    assert_eq!(stats.refresh_ok.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn poller_saves_daily_snapshot_when_enabled() {
    let store = InMemorySnapshotStore::new();
    let stats = Arc::new(AppStats::default());
    let (state_tx, mut state_rx) = watch::channel(FeedState::default());
    let handle = start(
        PollerDeps {
            source: Arc::new(StaticSheetSource::new(sample_csv())),
            store: Arc::new(store.clone()),
            state_tx,
            stats: stats.clone(),
        },
        config(true),
    );

    state_rx.changed().await.unwrap();
    // The cycle that published has finished once stop returns.
    handle.stop().await;

    let saved = store.list(10).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].snapshot.kind, SnapshotKind::Auto);
    assert_eq!(saved[0].snapshot.provenance, Provenance::Live);
    assert_eq!(saved[0].snapshot.total_active, 60);
    assert_eq!(stats.snapshots_saved.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn ensure_daily_snapshot_once_per_day() {
    let store = InMemorySnapshotStore::new();
    let live = LiveData {
        fetched_at: Utc::now(),
        records: record_set(vec![active("A", "TES", "N", 5)], vec![]),
        rejected_rows: 0,
    };

    let first = ensure_daily_snapshot(&store, &live).await.unwrap();
    assert!(first.is_some());
    let second = ensure_daily_snapshot(&store, &live).await.unwrap();
    assert!(second.is_none());
    assert_eq!(store.list(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ensure_daily_snapshot_skips_empty_and_saves_after_older_day() {
    let store = InMemorySnapshotStore::new();
    let empty = LiveData {
        fetched_at: Utc::now(),
        records: record_set(vec![], vec![]),
        rejected_rows: 0,
    };
    assert!(ensure_daily_snapshot(&store, &empty).await.unwrap().is_none());

    store
        .insert_raw(
            SnapshotKind::Manual,
            Provenance::Live,
            "[]".into(),
            "[]".into(),
            Totals::default(),
            Utc::now() - ChronoDuration::days(2),
        )
        .await;
    let live = LiveData {
        fetched_at: Utc::now(),
        records: record_set(vec![active("A", "TES", "N", 5)], vec![]),
        rejected_rows: 0,
    };
    let saved = ensure_daily_snapshot(&store, &live).await.unwrap().unwrap();
    assert_eq!(saved.total_active, 5);
    assert_eq!(store.list(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn refresh_runs_one_cycle() {
    let source = StaticSheetSource::new(sample_csv());
    let live = refresh(&source).await.unwrap();
    assert_eq!(live.records.active.len(), 3);
    assert!(refresh(&FailingSheetSource).await.is_err());
}
