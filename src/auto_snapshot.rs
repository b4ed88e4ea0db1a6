// Scheduled auto snapshot: copies the newest manual snapshot's records forward.
// Fires on a cron schedule in local time; also callable directly (HTTP trigger).

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

use crate::error::StoreError;
use crate::models::{NewSnapshot, Provenance, RecordSet, Snapshot, SnapshotKind};
use crate::poller::AppStats;
use crate::snapshot_repo::SnapshotStore;

/// Inserts an auto snapshot carrying forward the newest manual snapshot's records.
/// Sides that failed validation on read are carried as empty lists. With no manual
/// snapshot at all, an empty auto snapshot is inserted.
#[instrument(skip(store), fields(operation = "auto_snapshot"))]
pub async fn run_auto_snapshot(store: &dyn SnapshotStore) -> Result<Snapshot, StoreError> {
    let (records, source_snapshot_id) = match store.latest(SnapshotKind::Manual).await? {
        Some(manual) => {
            if manual.has_data_issues {
                warn!(
                    snapshot_id = %manual.snapshot.id,
                    "carrying forward a manual snapshot with invalid record data"
                );
            }
            let records = manual.snapshot.records();
            (records, Some(manual.snapshot.id))
        }
        None => {
            info!("no manual snapshot yet; saving an empty auto snapshot");
            (RecordSet::default(), None)
        }
    };

    let new = NewSnapshot::new(
        SnapshotKind::Auto,
        Provenance::CarriedForward { source_snapshot_id },
        records,
    );
    store.insert(new).await
}

/// Runs `run_auto_snapshot` at every time matched by `schedule` until `shutdown_rx` fires.
pub fn spawn(
    store: Arc<dyn SnapshotStore>,
    schedule: String,
    stats: Arc<AppStats>,
    shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(store, schedule, stats, shutdown_rx).await;
    })
}

#[instrument(skip(store, stats, shutdown_rx))]
async fn run(
    store: Arc<dyn SnapshotStore>,
    schedule: String,
    stats: Arc<AppStats>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let Ok(schedule) = cron::Schedule::from_str(&schedule) else {
        warn!(cron = %schedule, "invalid auto_snapshot.schedule; auto snapshots will not run");
        return;
    };

    loop {
        let now = chrono::Local::now();
        let delay = match schedule.after(&now).next() {
            Some(next) => (next - now).to_std().unwrap_or(Duration::from_secs(1)),
            None => Duration::from_secs(3600),
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                match run_auto_snapshot(store.as_ref()).await {
                    Ok(s) => {
                        stats.snapshots_saved.fetch_add(1, Ordering::Relaxed);
                        info!(
                            snapshot_id = %s.id,
                            total_active = s.total_active,
                            total_expired = s.total_expired,
                            "auto snapshot saved"
                        );
                    }
                    Err(e) => warn!(error = %e, "auto snapshot failed"),
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Auto-snapshot scheduler shutting down");
                break;
            }
        }
    }
}
