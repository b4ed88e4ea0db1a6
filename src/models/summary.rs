// Derived views: zone summaries, combined dealer rows, totals.
// Recomputed on every aggregation call; never persisted on their own.

use serde::{Deserialize, Serialize};

use super::RiskLevel;

/// Grouped sums for one (zone, service) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub zone: String,
    pub service: String,
    pub total_active: u64,
    pub total_expired: u64,
}

/// One dealer/service with both counts side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerData {
    pub dealer: String,
    pub service: String,
    pub zone: String,
    pub active_users: u32,
    pub expired_users: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTotals {
    pub tes_active: u64,
    pub tes_expired: u64,
    pub mcsol_active: u64,
    pub mcsol_expired: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_active: u64,
    pub total_expired: u64,
    pub total_dealer_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Summary of one record set, as shown for a historical snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub totals: Totals,
    pub total_expired_dealers: u64,
    /// expired / (active + expired) * 100; 0 when both are 0.
    pub expired_rate: f64,
    pub risk: RiskCounts,
    pub families: FamilyTotals,
}

/// Expired dealer row in a listing, annotated with its risk bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredListingRow {
    pub dealer: String,
    pub service: String,
    pub zone: String,
    pub expired_users: u32,
    pub risk: RiskLevel,
}
