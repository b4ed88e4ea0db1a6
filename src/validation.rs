// Store-boundary checks for record blobs.
// A blob is trusted only if it is an array whose every element is an object with
// string `dealer`/`service`/`zone` and a numeric count field. Anything else is a
// ValidationError; callers substitute an empty list and flag the snapshot.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::{ActiveDealerData, DataIssues, ExpiredDealerData};

const ACTIVE_COUNT_FIELD: &str = "activeUsers";
const EXPIRED_COUNT_FIELD: &str = "expiredUsers";

struct Fields {
    dealer: String,
    service: String,
    zone: String,
    count: u32,
    observed_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn string_field(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, ValidationError> {
    match obj.get(field) {
        None => Err(ValidationError::MissingField { index, field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType {
            index,
            field,
            expected: "string",
        }),
    }
}

/// Whole, non-negative numbers up to u32::MAX; `42` and `42.0` are the same count.
fn whole_count(n: &serde_json::Number) -> Option<u32> {
    if let Some(v) = n.as_u64() {
        return u32::try_from(v).ok();
    }
    let f = n.as_f64()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX)).then_some(f as u32)
}

fn count_field(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<u32, ValidationError> {
    match obj.get(field) {
        None => Err(ValidationError::MissingField { index, field }),
        Some(Value::Number(n)) => {
            whole_count(n).ok_or(ValidationError::OutOfRange { index, field })
        }
        Some(_) => Err(ValidationError::WrongType {
            index,
            field,
            expected: "number",
        }),
    }
}

fn validate_records(value: &Value, count_name: &'static str) -> Result<Vec<Fields>, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::NotAnArray);
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let Value::Object(obj) = item else {
                return Err(ValidationError::NotAnObject { index });
            };
            Ok(Fields {
                dealer: string_field(obj, index, "dealer")?,
                service: string_field(obj, index, "service")?,
                zone: string_field(obj, index, "zone")?,
                count: count_field(obj, index, count_name)?,
                // Optional and informational; an unreadable stamp is dropped, not fatal.
                observed_at: obj
                    .get("observedAt")
                    .and_then(|v| serde_json::from_value(v.clone()).ok()),
            })
        })
        .collect()
}

pub fn validate_active(value: &Value) -> Result<Vec<ActiveDealerData>, ValidationError> {
    Ok(validate_records(value, ACTIVE_COUNT_FIELD)?
        .into_iter()
        .map(|f| ActiveDealerData {
            dealer: f.dealer,
            service: f.service,
            zone: f.zone,
            active_users: f.count,
            observed_at: f.observed_at,
        })
        .collect())
}

pub fn validate_expired(value: &Value) -> Result<Vec<ExpiredDealerData>, ValidationError> {
    Ok(validate_records(value, EXPIRED_COUNT_FIELD)?
        .into_iter()
        .map(|f| ExpiredDealerData {
            dealer: f.dealer,
            service: f.service,
            zone: f.zone,
            expired_users: f.count,
            observed_at: f.observed_at,
        })
        .collect())
}

pub fn is_valid_active(value: &Value) -> bool {
    validate_active(value).is_ok()
}

pub fn is_valid_expired(value: &Value) -> bool {
    validate_expired(value).is_ok()
}

/// Decode raw stored text for one side: JSON parse then shape check.
fn decode_side<T>(
    raw: &str,
    validate: fn(&Value) -> Result<Vec<T>, ValidationError>,
) -> Result<Vec<T>, ValidationError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ValidationError::NotJson(e.to_string()))?;
    validate(&value)
}

/// Both sides of a stored snapshot. Invalid sides degrade to empty lists and are
/// reported in the returned `DataIssues`.
pub fn decode_record_blobs(
    snapshot_id: &str,
    active_raw: &str,
    expired_raw: &str,
) -> (Vec<ActiveDealerData>, Vec<ExpiredDealerData>, DataIssues) {
    let mut issues = DataIssues::default();
    let active = decode_side(active_raw, validate_active).unwrap_or_else(|e| {
        tracing::warn!(snapshot_id, side = "active", error = %e, "snapshot blob failed validation, using empty");
        issues.active = Some(e.to_string());
        Vec::new()
    });
    let expired = decode_side(expired_raw, validate_expired).unwrap_or_else(|e| {
        tracing::warn!(snapshot_id, side = "expired", error = %e, "snapshot blob failed validation, using empty");
        issues.expired = Some(e.to_string());
        Vec::new()
    });
    (active, expired, issues)
}
