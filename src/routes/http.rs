// GET handlers over live sheet data: version, summary, dealer listings

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use super::{AppError, AppState};
use crate::aggregation;
use crate::listing::{self, DealerQuery};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/summary: totals, per-family split and (zone, service) sums over the combined view.
pub(super) async fn summary_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let live = state.current_data().await?;
    let records = &live.records;
    let combined = aggregation::combine_dealers(&records.active, &records.expired);
    Ok(Json(json!({
        "fetchedAt": live.fetched_at,
        "rejectedRows": live.rejected_rows,
        "totals": aggregation::totals(&records.active, &records.expired),
        "families": aggregation::family_totals(&records.active, &records.expired),
        "risk": aggregation::risk_counts(&records.expired),
        "zones": aggregation::combined_zone_summaries(&combined),
    })))
}

/// GET /api/dealers/active?search=&service=&zone=&sort=
pub(super) async fn active_dealers_handler(
    State(state): State<AppState>,
    Query(query): Query<DealerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let live = state.current_data().await?;
    let active = &live.records.active;
    Ok(Json(json!({
        "fetchedAt": live.fetched_at,
        "totalActive": aggregation::sum_counts(active),
        "zones": aggregation::active_zone_summaries(active),
        "uniqueZones": aggregation::unique_zones(active),
        "dealers": listing::list_active(active, &query),
    })))
}

/// GET /api/dealers/expired?search=&service=&zone=&sort=: high-risk dealers listed first.
pub(super) async fn expired_dealers_handler(
    State(state): State<AppState>,
    Query(query): Query<DealerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let live = state.current_data().await?;
    let expired = &live.records.expired;
    Ok(Json(json!({
        "fetchedAt": live.fetched_at,
        "totalExpired": aggregation::sum_counts(expired),
        "zones": aggregation::expired_zone_summaries(expired),
        "uniqueZones": aggregation::unique_zones(expired),
        "risk": aggregation::risk_counts(expired),
        "highRisk": aggregation::high_expired_dealers(expired),
        "dealers": listing::list_expired(expired, &query),
    })))
}
