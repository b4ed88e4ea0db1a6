// Parsed rows + column indices -> active and expired dealer records.
// Each data row carries an active record and an expired record side by side; the
// inclusion rule is applied to each side independently. Malformed rows are dropped.

use chrono::{DateTime, Utc};

use super::columns::{ColumnIndices, SideColumns};
use crate::models::{ActiveDealerData, ExpiredDealerData, RecordSet, ServiceFamily};

/// True when a (dealer, service) pair may become a record: both non-empty and the
/// service belongs to a recognized family (which also excludes "zong").
pub fn is_included(dealer: &str, service: &str) -> bool {
    !dealer.is_empty() && !service.is_empty() && ServiceFamily::classify(service).is_some()
}

/// Leading base-10 digits of a trimmed field; 0 when there are none or on overflow.
/// Negative values count as 0.
pub fn parse_count(field: &str) -> u32 {
    let s = field.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

struct SideValues<'a> {
    dealer: &'a str,
    service: &'a str,
    zone: &'a str,
    count: u32,
}

fn read_side<'a>(row: &'a [String], cols: SideColumns) -> Option<SideValues<'a>> {
    let dealer = row.get(cols.dealer)?.trim();
    let service = row.get(cols.service)?.trim();
    let zone = row.get(cols.zone)?.trim();
    let count = parse_count(row.get(cols.count)?);
    is_included(dealer, service).then_some(SideValues {
        dealer,
        service,
        zone,
        count,
    })
}

/// Walks data rows (everything after the header). A side whose columns are not all
/// mapped contributes nothing.
pub fn extract_records(
    rows: &[Vec<String>],
    indices: &ColumnIndices,
    observed_at: DateTime<Utc>,
) -> RecordSet {
    let mut out = RecordSet::default();
    if rows.len() < 2 {
        return out;
    }
    let active_cols = indices.active_side();
    let expired_cols = indices.expired_side();
    let required_len = indices.max_index().map(|i| i + 1).unwrap_or(0);

    for row in &rows[1..] {
        if row.len() < required_len {
            continue;
        }
        if let Some(v) = active_cols.and_then(|cols| read_side(row, cols)) {
            out.active.push(ActiveDealerData {
                dealer: v.dealer.to_string(),
                service: v.service.to_string(),
                zone: v.zone.to_string(),
                active_users: v.count,
                observed_at: Some(observed_at),
            });
        }
        if let Some(v) = expired_cols.and_then(|cols| read_side(row, cols)) {
            out.expired.push(ExpiredDealerData {
                dealer: v.dealer.to_string(),
                service: v.service.to_string(),
                zone: v.zone.to_string(),
                expired_users: v.count,
                observed_at: Some(observed_at),
            });
        }
    }
    out
}
