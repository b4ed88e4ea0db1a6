// Domain models: sheet records, derived summaries, persisted snapshots, comparisons

mod comparison;
mod dealer;
mod snapshot;
mod summary;

pub use comparison::{
    ChangeDirection, Comparison, DealerDelta, HighRiskCounts, ZoneDelta, ZoneTotal,
};
pub use dealer::{
    ActiveDealerData, DealerRecord, ExpiredDealerData, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD,
    RecordSet, RiskLevel, ServiceFamily, UserKind,
};
pub use snapshot::{
    DataIssues, DownloadMetadata, DownloadedSnapshot, NewSnapshot, Provenance, Snapshot,
    SnapshotKind, StoredSnapshot,
};
pub use summary::{
    DealerData, ExpiredListingRow, FamilyTotals, RiskCounts, SnapshotSummary, Totals, ZoneSummary,
};
