// Output of comparing a live record set against a historical one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UserKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Increase,
    Decrease,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighRiskCounts {
    pub current: usize,
    pub previous: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTotal {
    pub zone: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDelta {
    pub zone: String,
    pub current: u64,
    pub previous: u64,
    pub difference: i64,
    pub direction: ChangeDirection,
    pub percent_change: f64,
}

/// One row of the per-dealer table. `previous` is 0 when the (dealer, service, zone)
/// triple is absent from the historical set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerDelta {
    pub dealer: String,
    pub service: String,
    pub zone: String,
    pub current: u32,
    pub previous: u32,
    pub difference: i64,
    pub direction: ChangeDirection,
    pub percent_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub mode: UserKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_date: Option<NaiveDate>,
    pub current_total: u64,
    pub previous_total: u64,
    pub difference: i64,
    pub direction: ChangeDirection,
    pub percent_change: f64,
    /// Expired mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_risk: Option<HighRiskCounts>,
    /// Expired mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones_current: Option<Vec<ZoneTotal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones_previous: Option<Vec<ZoneTotal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_deltas: Option<Vec<ZoneDelta>>,
    pub unique_zones: Vec<String>,
    /// Largest current count in the dealer table (at least 1), for scaling bars.
    pub max_current: u32,
    pub dealers: Vec<DealerDelta>,
}
