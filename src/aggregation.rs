// Grouped sums and totals over dealer records.
// Grouping keeps first-seen order of each key; nothing here allocates beyond the output.

use std::collections::{HashMap, HashSet};

use crate::models::{
    ActiveDealerData, DealerData, DealerRecord, ExpiredDealerData, FamilyTotals,
    HIGH_RISK_THRESHOLD, RecordSet, RiskCounts, RiskLevel, ServiceFamily, SnapshotSummary,
    Totals, ZoneSummary, ZoneTotal,
};

/// Insertion-ordered (zone, service) grouping.
#[derive(Default)]
struct ZoneServiceGroups {
    order: Vec<ZoneSummary>,
    index: HashMap<(String, String), usize>,
}

impl ZoneServiceGroups {
    fn add(&mut self, zone: &str, service: &str, active: u64, expired: u64) {
        let key = (zone.to_string(), service.to_string());
        let i = *self.index.entry(key).or_insert_with(|| {
            self.order.push(ZoneSummary {
                zone: zone.to_string(),
                service: service.to_string(),
                total_active: 0,
                total_expired: 0,
            });
            self.order.len() - 1
        });
        let entry = &mut self.order[i];
        entry.total_active += active;
        entry.total_expired += expired;
    }

    fn finish(self) -> Vec<ZoneSummary> {
        self.order
    }
}

pub fn active_zone_summaries(records: &[ActiveDealerData]) -> Vec<ZoneSummary> {
    let mut groups = ZoneServiceGroups::default();
    for r in records {
        groups.add(&r.zone, &r.service, r.active_users as u64, 0);
    }
    groups.finish()
}

pub fn expired_zone_summaries(records: &[ExpiredDealerData]) -> Vec<ZoneSummary> {
    let mut groups = ZoneServiceGroups::default();
    for r in records {
        groups.add(&r.zone, &r.service, 0, r.expired_users as u64);
    }
    groups.finish()
}

/// Both counts accumulate into the same (zone, service) entry regardless of origin.
pub fn combined_zone_summaries(records: &[DealerData]) -> Vec<ZoneSummary> {
    let mut groups = ZoneServiceGroups::default();
    for r in records {
        groups.add(
            &r.zone,
            &r.service,
            r.active_users as u64,
            r.expired_users as u64,
        );
    }
    groups.finish()
}

/// Merge both sides by (dealer, service). Active rows come first and fix the zone;
/// expired rows fill in `expired_users` or append a row with `active_users = 0`.
pub fn combine_dealers(active: &[ActiveDealerData], expired: &[ExpiredDealerData]) -> Vec<DealerData> {
    let mut rows: Vec<DealerData> = Vec::with_capacity(active.len().max(expired.len()));
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for a in active {
        let key = (a.dealer.as_str(), a.service.as_str());
        let row = DealerData {
            dealer: a.dealer.clone(),
            service: a.service.clone(),
            zone: a.zone.clone(),
            active_users: a.active_users,
            expired_users: 0,
        };
        match index.get(&key) {
            Some(&i) => rows[i] = row,
            None => {
                index.insert(key, rows.len());
                rows.push(row);
            }
        }
    }
    for e in expired {
        let key = (e.dealer.as_str(), e.service.as_str());
        match index.get(&key) {
            Some(&i) => rows[i].expired_users = e.expired_users,
            None => {
                index.insert(key, rows.len());
                rows.push(DealerData {
                    dealer: e.dealer.clone(),
                    service: e.service.clone(),
                    zone: e.zone.clone(),
                    active_users: 0,
                    expired_users: e.expired_users,
                });
            }
        }
    }
    rows
}

pub fn sum_counts<R: DealerRecord>(records: &[R]) -> u64 {
    records.iter().map(|r| r.count() as u64).sum()
}

/// Distinct dealer names across both lists.
pub fn distinct_dealers(active: &[ActiveDealerData], expired: &[ExpiredDealerData]) -> u64 {
    active
        .iter()
        .map(|r| r.dealer.as_str())
        .chain(expired.iter().map(|r| r.dealer.as_str()))
        .collect::<HashSet<_>>()
        .len() as u64
}

pub fn totals(active: &[ActiveDealerData], expired: &[ExpiredDealerData]) -> Totals {
    Totals {
        total_active: sum_counts(active),
        total_expired: sum_counts(expired),
        total_dealer_count: distinct_dealers(active, expired),
    }
}

/// Dealers with at least `HIGH_RISK_THRESHOLD` expired users, in input order.
pub fn high_expired_dealers(records: &[ExpiredDealerData]) -> Vec<&ExpiredDealerData> {
    records
        .iter()
        .filter(|r| r.expired_users >= HIGH_RISK_THRESHOLD)
        .collect()
}

pub fn high_risk_count(records: &[ExpiredDealerData]) -> usize {
    records.iter().filter(|r| r.is_high_risk()).count()
}

pub fn risk_counts(records: &[ExpiredDealerData]) -> RiskCounts {
    let mut counts = RiskCounts::default();
    for r in records {
        match r.risk_level() {
            RiskLevel::High => counts.high += 1,
            RiskLevel::Medium => counts.medium += 1,
            RiskLevel::Low => counts.low += 1,
        }
    }
    counts
}

pub fn family_totals(active: &[ActiveDealerData], expired: &[ExpiredDealerData]) -> FamilyTotals {
    let mut t = FamilyTotals::default();
    for r in active {
        match ServiceFamily::classify(&r.service) {
            Some(ServiceFamily::Tes) => t.tes_active += r.active_users as u64,
            Some(ServiceFamily::McSol) => t.mcsol_active += r.active_users as u64,
            None => {}
        }
    }
    for r in expired {
        match ServiceFamily::classify(&r.service) {
            Some(ServiceFamily::Tes) => t.tes_expired += r.expired_users as u64,
            Some(ServiceFamily::McSol) => t.mcsol_expired += r.expired_users as u64,
            None => {}
        }
    }
    t
}

/// Non-empty zones in first-seen order.
pub fn unique_zones<R: DealerRecord>(records: &[R]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.zone())
        .filter(|z| !z.is_empty() && seen.insert(*z))
        .map(str::to_string)
        .collect()
}

/// Per-zone totals (service ignored), skipping records without a zone.
pub fn zone_totals<R: DealerRecord>(records: &[R]) -> Vec<ZoneTotal> {
    let mut out: Vec<ZoneTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for r in records {
        let zone = r.zone();
        if zone.is_empty() {
            continue;
        }
        let i = *index.entry(zone).or_insert_with(|| {
            out.push(ZoneTotal {
                zone: zone.to_string(),
                total: 0,
            });
            out.len() - 1
        });
        out[i].total += r.count() as u64;
    }
    out
}

pub fn summarize(records: &RecordSet) -> SnapshotSummary {
    let totals = totals(&records.active, &records.expired);
    let total_expired_dealers = records
        .expired
        .iter()
        .map(|r| r.dealer.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;
    let denominator = totals.total_active + totals.total_expired;
    let expired_rate = if denominator > 0 {
        totals.total_expired as f64 / denominator as f64 * 100.0
    } else {
        0.0
    };
    SnapshotSummary {
        totals,
        total_expired_dealers,
        expired_rate,
        risk: risk_counts(&records.expired),
        families: family_totals(&records.active, &records.expired),
    }
}
