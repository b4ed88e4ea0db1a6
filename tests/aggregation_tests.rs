// Aggregation: zone grouping, totals, risk buckets, combined view, listings

mod common;

use common::{active, expired, record_set};
use dealerboard::aggregation::*;
use dealerboard::listing::{DealerQuery, SortKey, list_active, list_expired};
use dealerboard::models::{RiskLevel, ServiceFamily};

#[test]
fn expired_grouping_and_high_risk_count() {
    let records = vec![expired("A", "TES", "N", 25), expired("B", "McSOL", "N", 5)];
    let zones = expired_zone_summaries(&records);
    assert_eq!(zones.len(), 2);
    assert_eq!((zones[0].zone.as_str(), zones[0].service.as_str()), ("N", "TES"));
    assert_eq!(zones[0].total_expired, 25);
    assert_eq!(zones[1].total_expired, 5);
    assert_eq!(high_risk_count(&records), 1);
    assert_eq!(high_expired_dealers(&records)[0].dealer, "A");
}

#[test]
fn grouping_conserves_totals() {
    let records = vec![
        active("A", "TES", "N", 3),
        active("B", "TES", "N", 4),
        active("C", "McSOL", "S", 10),
        active("D", "TES", "", 1),
        active("E", "McSOL", "N", 0),
    ];
    let zones = active_zone_summaries(&records);
    let grouped: u64 = zones.iter().map(|z| z.total_active).sum();
    assert_eq!(grouped, sum_counts(&records));
    assert_eq!(grouped, 18);
    // first-seen order of (zone, service)
    let keys: Vec<_> = zones
        .iter()
        .map(|z| (z.zone.as_str(), z.service.as_str()))
        .collect();
    assert_eq!(keys, vec![("N", "TES"), ("S", "McSOL"), ("", "TES"), ("N", "McSOL")]);
}

#[test]
fn combined_view_merges_by_dealer_and_service() {
    let a = vec![active("A", "TES", "N", 10), active("B", "McSOL", "S", 4)];
    let e = vec![expired("A", "TES", "N", 3), expired("C", "TES", "N", 7)];
    let combined = combine_dealers(&a, &e);
    assert_eq!(combined.len(), 3);
    assert_eq!((combined[0].active_users, combined[0].expired_users), (10, 3));
    assert_eq!((combined[1].active_users, combined[1].expired_users), (4, 0));
    assert_eq!((combined[2].active_users, combined[2].expired_users), (0, 7));

    let zones = combined_zone_summaries(&combined);
    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].zone, "N");
    assert_eq!(zones[0].service, "TES");
    assert_eq!((zones[0].total_active, zones[0].total_expired), (10, 10));
}

#[test]
fn totals_count_distinct_dealers_across_sides() {
    let a = vec![active("A", "TES", "N", 10), active("A", "McSOL", "N", 2)];
    let e = vec![expired("A", "TES", "N", 3), expired("B", "TES", "S", 1)];
    let t = totals(&a, &e);
    assert_eq!(t.total_active, 12);
    assert_eq!(t.total_expired, 4);
    assert_eq!(t.total_dealer_count, 2);
}

#[test]
fn risk_buckets_use_thresholds() {
    assert_eq!(RiskLevel::from_expired(20), RiskLevel::High);
    assert_eq!(RiskLevel::from_expired(19), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_expired(10), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_expired(9), RiskLevel::Low);

    let e = vec![
        expired("A", "TES", "N", 30),
        expired("B", "TES", "N", 12),
        expired("C", "TES", "N", 1),
        expired("D", "TES", "N", 0),
    ];
    let counts = risk_counts(&e);
    assert_eq!((counts.high, counts.medium, counts.low), (1, 1, 2));
}

#[test]
fn family_totals_split_by_service() {
    let a = vec![active("A", "TES Gold", "N", 10), active("B", "mcsol", "N", 4)];
    let e = vec![expired("A", "TES Gold", "N", 3), expired("C", "Other", "N", 50)];
    let f = family_totals(&a, &e);
    assert_eq!((f.tes_active, f.tes_expired), (10, 3));
    assert_eq!((f.mcsol_active, f.mcsol_expired), (4, 0));
    assert_eq!(ServiceFamily::classify("McSOL Pro"), Some(ServiceFamily::McSol));
    assert_eq!(ServiceFamily::classify("zong tes"), None);
}

#[test]
fn summary_expired_rate() {
    let set = record_set(
        vec![active("A", "TES", "N", 75)],
        vec![expired("A", "TES", "N", 25), expired("B", "TES", "S", 0)],
    );
    let s = summarize(&set);
    assert_eq!(s.totals.total_active, 75);
    assert_eq!(s.total_expired_dealers, 2);
    assert!((s.expired_rate - 25.0).abs() < 1e-9);
    assert_eq!(summarize(&record_set(vec![], vec![])).expired_rate, 0.0);
}

#[test]
fn zone_helpers_skip_empty_zones() {
    let e = vec![
        expired("A", "TES", "N", 5),
        expired("B", "TES", "", 5),
        expired("C", "TES", "S", 2),
        expired("D", "McSOL", "N", 1),
    ];
    assert_eq!(unique_zones(&e), vec!["N", "S"]);
    let totals = zone_totals(&e);
    assert_eq!(totals.len(), 2);
    assert_eq!((totals[0].zone.as_str(), totals[0].total), ("N", 6));
}

#[test]
fn active_listing_filters_and_sorts() {
    let a = vec![
        active("Zeta", "TES", "N", 1),
        active("alpha", "McSOL", "S", 9),
        active("Beta", "TES Gold", "N", 5),
    ];
    let all = list_active(&a, &DealerQuery::default());
    let names: Vec<_> = all.iter().map(|r| r.dealer.as_str()).collect();
    assert_eq!(names, vec!["alpha", "Beta", "Zeta"]);

    let q = DealerQuery {
        service: Some("tes".into()),
        zone: Some("N".into()),
        sort: SortKey::Dealer,
        ..Default::default()
    };
    let names: Vec<_> = list_active(&a, &q).iter().map(|r| r.dealer.clone()).collect();
    assert_eq!(names, vec!["Beta", "Zeta"]);

    let q = DealerQuery {
        search: Some("ALP".into()),
        service: Some("all".into()),
        zone: Some("all".into()),
        ..Default::default()
    };
    assert_eq!(list_active(&a, &q).len(), 1);
}

#[test]
fn expired_listing_puts_high_risk_first() {
    let e = vec![
        expired("A", "TES", "N", 3),
        expired("B", "TES", "N", 21),
        expired("C", "TES", "S", 15),
        expired("D", "TES", "S", 40),
    ];
    let q = DealerQuery {
        sort: SortKey::Dealer,
        ..Default::default()
    };
    let rows = list_expired(&e, &q);
    let names: Vec<_> = rows.iter().map(|r| r.dealer.as_str()).collect();
    assert_eq!(names, vec!["D", "B", "A", "C"]);
    assert_eq!(rows[0].risk, RiskLevel::High);
    assert_eq!(rows[3].risk, RiskLevel::Medium);
}
