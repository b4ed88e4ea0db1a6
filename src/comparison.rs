// Current vs historical record sets: totals, per-zone and per-dealer deltas.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::aggregation::{high_risk_count, sum_counts, unique_zones, zone_totals};
use crate::models::{
    ChangeDirection, Comparison, DealerDelta, DealerRecord, HighRiskCounts, RecordSet,
    StoredSnapshot, UserKind, ZoneDelta, ZoneTotal,
};

/// Signed change between two counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub difference: i64,
    pub direction: ChangeDirection,
    /// |difference| / previous * 100; exactly 0 when previous is 0.
    pub percent: f64,
}

pub fn classify_change(current: u64, previous: u64) -> Change {
    let difference = current as i64 - previous as i64;
    let direction = match difference {
        d if d > 0 => ChangeDirection::Increase,
        d if d < 0 => ChangeDirection::Decrease,
        _ => ChangeDirection::Unchanged,
    };
    let percent = if previous > 0 {
        difference.unsigned_abs() as f64 / previous as f64 * 100.0
    } else {
        0.0
    };
    Change {
        difference,
        direction,
        percent,
    }
}

pub fn compare(current: &RecordSet, historical: &RecordSet, mode: UserKind) -> Comparison {
    match mode {
        UserKind::Active => compare_side(&current.active, &historical.active, mode, None),
        UserKind::Expired => {
            let high_risk = HighRiskCounts {
                current: high_risk_count(&current.expired),
                previous: high_risk_count(&historical.expired),
            };
            compare_side(
                &current.expired,
                &historical.expired,
                mode,
                Some(high_risk),
            )
        }
    }
}

fn compare_side<R: DealerRecord>(
    current: &[R],
    previous: &[R],
    mode: UserKind,
    high_risk: Option<HighRiskCounts>,
) -> Comparison {
    let current_total = sum_counts(current);
    let previous_total = sum_counts(previous);
    let total_change = classify_change(current_total, previous_total);

    let (zones_current, zones_previous, zone_deltas) = if mode == UserKind::Expired {
        let cur = zone_totals(current);
        let prev = zone_totals(previous);
        let deltas = zone_deltas(&cur, &prev);
        (Some(cur), Some(prev), Some(deltas))
    } else {
        (None, None, None)
    };

    let dealers = dealer_deltas(current, previous);
    let max_current = dealers.iter().map(|d| d.current).max().unwrap_or(0).max(1);

    Comparison {
        mode,
        historical_date: None,
        current_total,
        previous_total,
        difference: total_change.difference,
        direction: total_change.direction,
        percent_change: total_change.percent,
        high_risk,
        zones_current,
        zones_previous,
        zone_deltas,
        unique_zones: unique_zones(current),
        max_current,
        dealers,
    }
}

/// Deltas for every current zone, then zones only present in the previous set.
fn zone_deltas(current: &[ZoneTotal], previous: &[ZoneTotal]) -> Vec<ZoneDelta> {
    let prev_by_zone: HashMap<&str, u64> = previous
        .iter()
        .map(|z| (z.zone.as_str(), z.total))
        .collect();
    let cur_by_zone: HashMap<&str, u64> = current
        .iter()
        .map(|z| (z.zone.as_str(), z.total))
        .collect();

    let current_rows = current.iter().map(|z| {
        let prev = prev_by_zone.get(z.zone.as_str()).copied().unwrap_or(0);
        zone_delta(&z.zone, z.total, prev)
    });
    let dropped_rows = previous
        .iter()
        .filter(|z| !cur_by_zone.contains_key(z.zone.as_str()))
        .map(|z| zone_delta(&z.zone, 0, z.total));
    current_rows.chain(dropped_rows).collect()
}

fn zone_delta(zone: &str, current: u64, previous: u64) -> ZoneDelta {
    let change = classify_change(current, previous);
    ZoneDelta {
        zone: zone.to_string(),
        current,
        previous,
        difference: change.difference,
        direction: change.direction,
        percent_change: change.percent,
    }
}

/// One row per current record, matched on the exact (dealer, service, zone) triple.
/// Sorted by current count descending; ties keep input order (stable sort), which
/// callers should not rely on.
fn dealer_deltas<R: DealerRecord>(current: &[R], previous: &[R]) -> Vec<DealerDelta> {
    let mut prev_by_key: HashMap<(&str, &str, &str), u32> = HashMap::new();
    for r in previous {
        // First occurrence wins, as a linear search would.
        prev_by_key
            .entry((r.dealer(), r.service(), r.zone()))
            .or_insert(r.count());
    }

    let mut rows: Vec<DealerDelta> = current
        .iter()
        .map(|r| {
            let prev = prev_by_key
                .get(&(r.dealer(), r.service(), r.zone()))
                .copied()
                .unwrap_or(0);
            let change = classify_change(r.count() as u64, prev as u64);
            DealerDelta {
                dealer: r.dealer().to_string(),
                service: r.service().to_string(),
                zone: r.zone().to_string(),
                current: r.count(),
                previous: prev,
                difference: change.difference,
                direction: change.direction,
                percent_change: change.percent,
            }
        })
        .collect();
    rows.sort_by_key(|d| Reverse(d.current));
    rows
}

/// Distinct UTC creation dates, newest first.
pub fn available_dates(snapshots: &[StoredSnapshot]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = snapshots
        .iter()
        .map(|s| s.snapshot.created_at.date_naive())
        .collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();
    dates
}

/// Newest snapshot created on `date` (UTC).
pub fn snapshot_for_date(snapshots: &[StoredSnapshot], date: NaiveDate) -> Option<&StoredSnapshot> {
    snapshots
        .iter()
        .filter(|s| s.snapshot.created_at.date_naive() == date)
        .max_by_key(|s| s.snapshot.created_at)
}

/// Compare against the snapshot for `date`, or the newest available date when `None`.
/// Returns `None` when no snapshot matches.
pub fn compare_with_history(
    current: &RecordSet,
    snapshots: &[StoredSnapshot],
    date: Option<NaiveDate>,
    mode: UserKind,
) -> Option<Comparison> {
    let date = date.or_else(|| available_dates(snapshots).first().copied())?;
    let selected = snapshot_for_date(snapshots, date)?;
    let mut comparison = compare(current, &selected.snapshot.records(), mode);
    comparison.historical_date = Some(date);
    Some(comparison)
}
