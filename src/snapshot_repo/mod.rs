// Snapshot persistence. Append-only inserts, point deletes, newest-first bounded reads.
// Record lists are stored as JSON text and re-validated on every read.

mod memory;

pub use memory::InMemorySnapshotStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewSnapshot, Provenance, Snapshot, SnapshotKind, StoredSnapshot};
use crate::validation;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn insert(&self, new: NewSnapshot) -> Result<Snapshot, StoreError>;

    /// Newest first, at most `limit` rows.
    async fn list(&self, limit: u32) -> Result<Vec<StoredSnapshot>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<StoredSnapshot>, StoreError>;

    /// Every snapshot created on `date` (UTC), newest first. Not bounded by a list limit.
    async fn created_on(&self, date: NaiveDate) -> Result<Vec<StoredSnapshot>, StoreError>;

    /// Newest snapshot of the given kind.
    async fn latest(&self, kind: SnapshotKind) -> Result<Option<StoredSnapshot>, StoreError>;

    /// Returns true if a row was deleted.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Snapshot ids are UUIDs; anything else is rejected before touching a store.
pub fn parse_snapshot_id(id: &str) -> Result<Uuid, StoreError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Uuid::parse_str(trimmed).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// [start, end) of a UTC calendar day in epoch milliseconds.
fn day_bounds_millis(date: NaiveDate) -> (i64, i64) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
    (start, start + 86_400_000)
}

pub struct SnapshotRepo {
    pool: SqlitePool,
}

impl SnapshotRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                id TEXT PRIMARY KEY,
                snapshot_type TEXT NOT NULL,
                provenance TEXT NOT NULL,
                active_data TEXT NOT NULL,
                expired_data TEXT NOT NULL,
                total_active INTEGER NOT NULL,
                total_expired INTEGER NOT NULL,
                total_dealers INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_snapshots_created_at ON snapshots(created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn parse_row(row: &SqliteRow) -> Result<StoredSnapshot, StoreError> {
        let id: String = row.try_get("id")?;
        let kind_raw: String = row.try_get("snapshot_type")?;
        let provenance_raw: String = row.try_get("provenance")?;
        let active_raw: String = row.try_get("active_data")?;
        let expired_raw: String = row.try_get("expired_data")?;
        let total_active: i64 = row.try_get("total_active")?;
        let total_expired: i64 = row.try_get("total_expired")?;
        let total_dealers: i64 = row.try_get("total_dealers")?;
        let created_at_ms: i64 = row.try_get("created_at")?;

        let kind = SnapshotKind::parse(&kind_raw)
            .ok_or_else(|| StoreError::Corrupt(format!("{id}: unknown snapshot_type {kind_raw:?}")))?;
        let provenance: Provenance = serde_json::from_str(&provenance_raw)
            .map_err(|e| StoreError::Corrupt(format!("{id}: provenance: {e}")))?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_at_ms)
            .ok_or_else(|| StoreError::Corrupt(format!("{id}: created_at {created_at_ms}")))?;

        let (active_records, expired_records, issues) =
            validation::decode_record_blobs(&id, &active_raw, &expired_raw);

        Ok(StoredSnapshot::new(
            Snapshot {
                id,
                kind,
                provenance,
                active_records,
                expired_records,
                total_active: total_active.max(0) as u64,
                total_expired: total_expired.max(0) as u64,
                total_dealer_count: total_dealers.max(0) as u64,
                created_at,
            },
            issues,
        ))
    }

    /// Corrupt rows are skipped (and logged) rather than failing the whole list.
    fn parse_rows(rows: &[SqliteRow]) -> Vec<StoredSnapshot> {
        rows.iter()
            .filter_map(|row| match Self::parse_row(row) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(error = %e, "invalid snapshot row, skipping");
                    None
                }
            })
            .collect()
    }
}

const LATEST_PAGE_SIZE: i64 = 16;

const SELECT_COLUMNS: &str = "SELECT id, snapshot_type, provenance, active_data, expired_data, \
     total_active, total_expired, total_dealers, created_at FROM snapshots";

#[async_trait]
impl SnapshotStore for SnapshotRepo {
    #[instrument(skip(self, new), fields(repo = "snapshots", operation = "insert", kind = new.kind.as_str()))]
    async fn insert(&self, new: NewSnapshot) -> Result<Snapshot, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let active_data = serde_json::to_string(&new.records.active)?;
        let expired_data = serde_json::to_string(&new.records.expired)?;
        let provenance = serde_json::to_string(&new.provenance)?;

        sqlx::query(
            "INSERT INTO snapshots (id, snapshot_type, provenance, active_data, expired_data, total_active, total_expired, total_dealers, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&id)
        .bind(new.kind.as_str())
        .bind(&provenance)
        .bind(&active_data)
        .bind(&expired_data)
        .bind(new.totals.total_active as i64)
        .bind(new.totals.total_expired as i64)
        .bind(new.totals.total_dealer_count as i64)
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        tracing::debug!(snapshot_id = %id, "snapshot saved");
        Ok(Snapshot {
            id,
            kind: new.kind,
            provenance: new.provenance,
            active_records: new.records.active,
            expired_records: new.records.expired,
            total_active: new.totals.total_active,
            total_expired: new.totals.total_expired,
            total_dealer_count: new.totals.total_dealer_count,
            created_at,
        })
    }

    #[instrument(skip(self), fields(repo = "snapshots", operation = "list"))]
    async fn list(&self, limit: u32) -> Result<Vec<StoredSnapshot>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(Self::parse_rows(&rows))
    }

    #[instrument(skip(self), fields(repo = "snapshots", operation = "get"))]
    async fn get(&self, id: &str) -> Result<Option<StoredSnapshot>, StoreError> {
        let id = parse_snapshot_id(id)?.to_string();
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_row).transpose()
    }

    #[instrument(skip(self), fields(repo = "snapshots", operation = "created_on"))]
    async fn created_on(&self, date: NaiveDate) -> Result<Vec<StoredSnapshot>, StoreError> {
        let (start, end) = day_bounds_millis(date);
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE created_at >= $1 AND created_at < $2 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(Self::parse_rows(&rows))
    }

    #[instrument(skip(self), fields(repo = "snapshots", operation = "latest", kind = kind.as_str()))]
    async fn latest(&self, kind: SnapshotKind) -> Result<Option<StoredSnapshot>, StoreError> {
        // Page newest-first so a corrupt newest row does not hide older readable ones.
        let mut offset: i64 = 0;
        loop {
            let rows = sqlx::query(&format!(
                "{SELECT_COLUMNS} WHERE snapshot_type = $1 ORDER BY created_at DESC, rowid DESC LIMIT $2 OFFSET $3"
            ))
            .bind(kind.as_str())
            .bind(LATEST_PAGE_SIZE)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
            if let Some(found) = Self::parse_rows(&rows).into_iter().next() {
                return Ok(Some(found));
            }
            if (rows.len() as i64) < LATEST_PAGE_SIZE {
                return Ok(None);
            }
            offset += LATEST_PAGE_SIZE;
        }
    }

    #[instrument(skip(self), fields(repo = "snapshots", operation = "delete"))]
    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = parse_snapshot_id(id)?.to_string();
        let r = sqlx::query("DELETE FROM snapshots WHERE id = $1")
            .bind(&id)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected() > 0)
    }
}
