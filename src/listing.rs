// Dealer listings: search/filter/sort for the active and expired tables.

use std::cmp::Reverse;

use serde::Deserialize;

use crate::models::{ActiveDealerData, DealerRecord, ExpiredDealerData, ExpiredListingRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Count, descending.
    #[default]
    Count,
    Dealer,
    Zone,
}

/// Listing filters. `service` and `zone` accept "all" to disable the filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DealerQuery {
    pub search: Option<String>,
    pub service: Option<String>,
    pub zone: Option<String>,
    pub sort: SortKey,
}

impl DealerQuery {
    fn matches<R: DealerRecord>(&self, r: &R) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => r
                .dealer()
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        };
        let service_ok = match self.service.as_deref() {
            Some(s) if !s.eq_ignore_ascii_case("all") => {
                r.service().to_lowercase().contains(&s.to_lowercase())
            }
            _ => true,
        };
        let zone_ok = match self.zone.as_deref() {
            Some(z) if z != "all" => r.zone() == z,
            _ => true,
        };
        search_ok && service_ok && zone_ok
    }
}

fn sort_records<R: DealerRecord>(records: &mut [R], key: SortKey) {
    match key {
        SortKey::Count => records.sort_by_key(|r| Reverse(r.count())),
        SortKey::Dealer => records.sort_by(|a, b| a.dealer().cmp(b.dealer())),
        SortKey::Zone => records.sort_by(|a, b| a.zone().cmp(b.zone())),
    }
}

pub fn list_active(records: &[ActiveDealerData], query: &DealerQuery) -> Vec<ActiveDealerData> {
    let mut out: Vec<ActiveDealerData> = records
        .iter()
        .filter(|r| query.matches(*r))
        .cloned()
        .collect();
    sort_records(&mut out, query.sort);
    out
}

/// High-risk dealers first (count descending), then the rest in the requested order.
pub fn list_expired(records: &[ExpiredDealerData], query: &DealerQuery) -> Vec<ExpiredListingRow> {
    let (mut high, mut normal): (Vec<ExpiredDealerData>, Vec<ExpiredDealerData>) = records
        .iter()
        .filter(|r| query.matches(*r))
        .cloned()
        .partition(|r| r.is_high_risk());
    sort_records(&mut high, SortKey::Count);
    sort_records(&mut normal, query.sort);
    high.into_iter()
        .chain(normal)
        .map(|r| ExpiredListingRow {
            risk: r.risk_level(),
            dealer: r.dealer,
            service: r.service,
            zone: r.zone,
            expired_users: r.expired_users,
        })
        .collect()
}
