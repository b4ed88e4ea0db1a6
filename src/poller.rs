// Fixed-interval sheet refresh.
// Each tick fetches, parses and extracts the sheet, then publishes the result on a
// watch channel (latest value wins). Cycles run one after another inside the task;
// a tick that comes due while a cycle is still running is skipped.
// The poller is owned through the handle returned by `start`; `stop` ends it.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{oneshot, watch};
use tokio::time::{Duration, interval};
use tracing::Instrument;

use crate::error::{FetchError, StoreError};
use crate::models::{NewSnapshot, Provenance, RecordSet, Snapshot, SnapshotKind};
use crate::sheet::{self, SheetSource};
use crate::snapshot_repo::SnapshotStore;

/// Records from one successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveData {
    pub fetched_at: DateTime<Utc>,
    pub records: RecordSet,
    /// Sheet rows skipped as unsupported input (escaped quotes).
    pub rejected_rows: usize,
}

/// What the dashboard currently knows about the sheet.
#[derive(Debug, Clone, Default)]
pub enum FeedState {
    #[default]
    Pending,
    Ready(Arc<LiveData>),
    Failed {
        message: String,
        at: DateTime<Utc>,
    },
}

impl FeedState {
    pub fn ready(&self) -> Option<Arc<LiveData>> {
        match self {
            FeedState::Ready(data) => Some(data.clone()),
            _ => None,
        }
    }
}

/// Counters shared by the poller, the auto-snapshot scheduler and the stats log.
#[derive(Debug, Default)]
pub struct AppStats {
    pub refresh_ok: AtomicU64,
    pub refresh_failed: AtomicU64,
    pub snapshots_saved: AtomicU64,
}

impl AppStats {
    pub fn log(&self) {
        tracing::info!(
            refresh_ok = self.refresh_ok.load(Ordering::Relaxed),
            refresh_failed = self.refresh_failed.load(Ordering::Relaxed),
            snapshots_saved = self.snapshots_saved.load(Ordering::Relaxed),
            "app stats"
        );
    }
}

pub struct PollerDeps {
    pub source: Arc<dyn SheetSource>,
    pub store: Arc<dyn SnapshotStore>,
    pub state_tx: watch::Sender<FeedState>,
    pub stats: Arc<AppStats>,
}

pub struct PollerConfig {
    pub interval: Duration,
    pub daily_snapshot: bool,
    pub stats_log_interval: Duration,
}

/// Owned handle to a running poller.
pub struct PollerHandle {
    shutdown_tx: oneshot::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

impl PollerHandle {
    /// Stops scheduling new cycles and waits for the task to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.join.await;
    }
}

/// One fetch-parse-extract cycle.
pub async fn refresh(source: &dyn SheetSource) -> Result<LiveData, FetchError> {
    let read = sheet::fetch_records(source).await?;
    Ok(LiveData {
        fetched_at: Utc::now(),
        records: read.records,
        rejected_rows: read.rejected.len(),
    })
}

/// Saves a live auto snapshot unless the newest snapshot is already from today (UTC).
pub async fn ensure_daily_snapshot(
    store: &dyn SnapshotStore,
    live: &LiveData,
) -> Result<Option<Snapshot>, StoreError> {
    if live.records.is_empty() {
        return Ok(None);
    }
    let today = live.fetched_at.date_naive();
    let newest = store.list(1).await?;
    if newest
        .first()
        .is_some_and(|s| s.snapshot.created_at.date_naive() == today)
    {
        return Ok(None);
    }
    let new = NewSnapshot::new(SnapshotKind::Auto, Provenance::Live, live.records.clone());
    store.insert(new).await.map(Some)
}

pub fn start(deps: PollerDeps, config: PollerConfig) -> PollerHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let PollerDeps {
        source,
        store,
        state_tx,
        stats,
    } = deps;

    let poller_span = tracing::span!(
        tracing::Level::DEBUG,
        "poller",
        interval_secs = config.interval.as_secs()
    );

    let join = tokio::spawn(
        async move {
            let mut tick = interval(config.interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut stats_log_tick = interval(config.stats_log_interval);
            stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        match refresh(source.as_ref()).await {
                            Ok(live) => {
                                stats.refresh_ok.fetch_add(1, Ordering::Relaxed);
                                let live = Arc::new(live);
                                state_tx.send_replace(FeedState::Ready(live.clone()));
                                if config.daily_snapshot {
                                    match ensure_daily_snapshot(store.as_ref(), &live).await {
                                        Ok(Some(s)) => {
                                            stats.snapshots_saved.fetch_add(1, Ordering::Relaxed);
                                            tracing::info!(snapshot_id = %s.id, "daily snapshot saved");
                                        }
                                        Ok(None) => {}
                                        Err(e) => tracing::warn!(
                                            error = %e,
                                            operation = "ensure_daily_snapshot",
                                            "daily snapshot failed"
                                        ),
                                    }
                                }
                            }
                            Err(e) => {
                                stats.refresh_failed.fetch_add(1, Ordering::Relaxed);
                                tracing::warn!(error = %e, operation = "refresh", "sheet refresh failed");
                                state_tx.send_replace(FeedState::Failed {
                                    message: e.to_string(),
                                    at: Utc::now(),
                                });
                            }
                        }
                    }
                    _ = stats_log_tick.tick() => {
                        stats.log();
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Poller shutting down");
                        break;
                    }
                }
            }
        }
        .instrument(poller_span),
    );

    PollerHandle { shutdown_tx, join }
}
