// Dealer records extracted from one sheet fetch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expired-user count at or above which a dealer is flagged high risk.
pub const HIGH_RISK_THRESHOLD: u32 = 20;
/// Expired-user count at or above which a dealer is flagged medium risk.
pub const MEDIUM_RISK_THRESHOLD: u32 = 10;

/// Which side of the sheet a record (or a comparison) is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Active,
    #[default]
    Expired,
}

/// Common view over active and expired records: identity fields plus the one count.
pub trait DealerRecord {
    fn dealer(&self) -> &str;
    fn service(&self) -> &str;
    fn zone(&self) -> &str;
    fn count(&self) -> u32;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDealerData {
    pub dealer: String,
    pub service: String,
    pub zone: String,
    pub active_users: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredDealerData {
    pub dealer: String,
    pub service: String,
    pub zone: String,
    pub expired_users: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl DealerRecord for ActiveDealerData {
    fn dealer(&self) -> &str {
        &self.dealer
    }
    fn service(&self) -> &str {
        &self.service
    }
    fn zone(&self) -> &str {
        &self.zone
    }
    fn count(&self) -> u32 {
        self.active_users
    }
}

impl DealerRecord for ExpiredDealerData {
    fn dealer(&self) -> &str {
        &self.dealer
    }
    fn service(&self) -> &str {
        &self.service
    }
    fn zone(&self) -> &str {
        &self.zone
    }
    fn count(&self) -> u32 {
        self.expired_users
    }
}

impl ExpiredDealerData {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_expired(self.expired_users)
    }

    pub fn is_high_risk(&self) -> bool {
        self.expired_users >= HIGH_RISK_THRESHOLD
    }
}

/// Both record lists of one fetch (or one snapshot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet {
    pub active: Vec<ActiveDealerData>,
    pub expired: Vec<ExpiredDealerData>,
}

impl RecordSet {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.expired.is_empty()
    }
}

/// Recognized product line, matched by substring in free-text service names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceFamily {
    #[serde(rename = "TES")]
    Tes,
    #[serde(rename = "McSOL")]
    McSol,
}

impl ServiceFamily {
    pub const EXCLUDED_TOKEN: &'static str = "zong";

    /// Family of a service name, or `None` when it is excluded or unrecognized.
    pub fn classify(service: &str) -> Option<Self> {
        let lower = service.to_lowercase();
        if lower.contains(Self::EXCLUDED_TOKEN) {
            None
        } else if lower.contains("tes") {
            Some(ServiceFamily::Tes)
        } else if lower.contains("mcsol") {
            Some(ServiceFamily::McSol)
        } else {
            None
        }
    }
}

/// Risk bucket for an expired-user count; serializes as "high" / "medium" / "low".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_expired(expired_users: u32) -> Self {
        if expired_users >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if expired_users >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}
