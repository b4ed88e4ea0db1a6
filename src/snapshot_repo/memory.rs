use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SnapshotStore, parse_snapshot_id};
use crate::error::StoreError;
use crate::models::{NewSnapshot, Provenance, Snapshot, SnapshotKind, StoredSnapshot, Totals};
use crate::validation;

/// Same JSON text the SQLite store keeps, so reads go through the same validator.
#[derive(Clone)]
struct StoredRow {
    id: String,
    kind: SnapshotKind,
    provenance: Provenance,
    active_data: String,
    expired_data: String,
    totals: Totals,
    created_at: DateTime<Utc>,
}

impl StoredRow {
    fn decode(&self) -> StoredSnapshot {
        let (active_records, expired_records, issues) =
            validation::decode_record_blobs(&self.id, &self.active_data, &self.expired_data);
        StoredSnapshot::new(
            Snapshot {
                id: self.id.clone(),
                kind: self.kind,
                provenance: self.provenance.clone(),
                active_records,
                expired_records,
                total_active: self.totals.total_active,
                total_expired: self.totals.total_expired,
                total_dealer_count: self.totals.total_dealer_count,
                created_at: self.created_at,
            },
            issues,
        )
    }
}

/// In-memory snapshot store. Clone-friendly (clones share the same rows).
/// Rows are kept in insertion order; reads walk it newest-first.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    rows: Arc<RwLock<Vec<StoredRow>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert with raw blobs and an explicit timestamp (imports and backdated fixtures).
    pub async fn insert_raw(
        &self,
        kind: SnapshotKind,
        provenance: Provenance,
        active_data: String,
        expired_data: String,
        totals: Totals,
        created_at: DateTime<Utc>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let mut rows = self.rows.write().await;
        rows.push(StoredRow {
            id: id.clone(),
            kind,
            provenance,
            active_data,
            expired_data,
            totals,
            created_at,
        });
        rows.sort_by_key(|r| r.created_at);
        id
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn insert(&self, new: NewSnapshot) -> Result<Snapshot, StoreError> {
        let active_data = serde_json::to_string(&new.records.active)?;
        let expired_data = serde_json::to_string(&new.records.expired)?;
        let created_at = Utc::now();
        let id = self
            .insert_raw(
                new.kind,
                new.provenance.clone(),
                active_data,
                expired_data,
                new.totals,
                created_at,
            )
            .await;
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

    async fn list(&self, limit: u32) -> Result<Vec<StoredSnapshot>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .rev()
            .take(limit as usize)
            .map(StoredRow::decode)
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredSnapshot>, StoreError> {
        let id = parse_snapshot_id(id)?.to_string();
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| r.id == id).map(StoredRow::decode))
    }

    async fn created_on(&self, date: NaiveDate) -> Result<Vec<StoredSnapshot>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.created_at.date_naive() == date)
            .map(StoredRow::decode)
            .collect())
    }

    async fn latest(&self, kind: SnapshotKind) -> Result<Option<StoredSnapshot>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .rev()
            .find(|r| r.kind == kind)
            .map(StoredRow::decode))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = parse_snapshot_id(id)?.to_string();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }
}
