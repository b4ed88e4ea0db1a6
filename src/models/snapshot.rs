// Persisted snapshot entity and the shapes built around it (insert request, download file).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActiveDealerData, ExpiredDealerData, RecordSet, Totals};
use crate::aggregation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Manual,
    Auto,
}

impl SnapshotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Manual => "manual",
            SnapshotKind::Auto => "auto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(SnapshotKind::Manual),
            "auto" => Some(SnapshotKind::Auto),
            _ => None,
        }
    }
}

/// Where a snapshot's records came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Provenance {
    /// Built from a fresh sheet fetch.
    Live,
    /// Records reused from an earlier snapshot (None when there was nothing to reuse).
    CarriedForward {
        #[serde(rename = "sourceSnapshotId")]
        source_snapshot_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub kind: SnapshotKind,
    pub provenance: Provenance,
    pub active_records: Vec<ActiveDealerData>,
    pub expired_records: Vec<ExpiredDealerData>,
    pub total_active: u64,
    pub total_expired: u64,
    pub total_dealer_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn records(&self) -> RecordSet {
        RecordSet {
            active: self.active_records.clone(),
            expired: self.expired_records.clone(),
        }
    }
}

/// Validation messages for blobs that failed the store-boundary check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataIssues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<String>,
}

impl DataIssues {
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.expired.is_none()
    }
}

/// A snapshot as read back from a store. Invalid sides have been replaced by empty lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub has_data_issues: bool,
    #[serde(default, skip_serializing_if = "DataIssues::is_empty")]
    pub data_issues: DataIssues,
}

impl StoredSnapshot {
    pub fn new(snapshot: Snapshot, data_issues: DataIssues) -> Self {
        Self {
            snapshot,
            has_data_issues: !data_issues.is_empty(),
            data_issues,
        }
    }
}

/// Insert request. Totals are computed from the records when the request is built.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub kind: SnapshotKind,
    pub provenance: Provenance,
    pub records: RecordSet,
    pub totals: Totals,
}

impl NewSnapshot {
    pub fn new(kind: SnapshotKind, provenance: Provenance, records: RecordSet) -> Self {
        let totals = aggregation::totals(&records.active, &records.expired);
        Self {
            kind,
            provenance,
            records,
            totals,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadMetadata {
    pub downloaded_at: DateTime<Utc>,
    pub total_records: usize,
}

/// User-facing export of one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedSnapshot {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub metadata: DownloadMetadata,
}

impl DownloadedSnapshot {
    pub fn new(snapshot: Snapshot, downloaded_at: DateTime<Utc>) -> Self {
        let total_records = snapshot.active_records.len() + snapshot.expired_records.len();
        Self {
            snapshot,
            metadata: DownloadMetadata {
                downloaded_at,
                total_records,
            },
        }
    }

    /// `snapshot-<kind>-<YYYY-MM-DD>.json`, dated by the snapshot's creation day (UTC).
    pub fn file_name(&self) -> String {
        format!(
            "snapshot-{}-{}.json",
            self.snapshot.kind.as_str(),
            self.snapshot.created_at.format("%Y-%m-%d")
        )
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
