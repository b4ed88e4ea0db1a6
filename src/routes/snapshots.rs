// Snapshot endpoints: save, list, delete, download, history and comparisons

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{AppError, AppState};
use crate::aggregation;
use crate::auto_snapshot;
use crate::comparison;
use crate::error::StoreError;
use crate::models::{
    DownloadedSnapshot, NewSnapshot, Provenance, SnapshotKind, StoredSnapshot, UserKind,
};
use crate::snapshot_repo::parse_snapshot_id;

#[derive(Debug, Deserialize)]
pub(super) struct ListParams {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryParams {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CompareParams {
    date: Option<String>,
    mode: Option<String>,
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("date must be YYYY-MM-DD, got {s:?}"))),
    }
}

fn parse_mode(raw: Option<&str>) -> Result<UserKind, AppError> {
    match raw {
        None | Some("") | Some("expired") => Ok(UserKind::Expired),
        Some("active") => Ok(UserKind::Active),
        Some(other) => Err(AppError::BadRequest(format!(
            "mode must be active or expired, got {other:?}"
        ))),
    }
}

/// GET /api/snapshots?limit=N: newest first.
pub(super) async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(state.config.database.list_limit);
    let snapshots = state.store.list(limit).await?;
    Ok(Json(snapshots))
}

/// POST /api/snapshots: manual snapshot from a fresh sheet fetch.
pub(super) async fn create_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let live = state.fresh_data().await?;
    let new = NewSnapshot::new(SnapshotKind::Manual, Provenance::Live, live.records.clone());
    let snapshot = state.store.insert(new).await?;
    tracing::info!(snapshot_id = %snapshot.id, "manual snapshot saved");
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// POST /api/snapshots/auto: same as one scheduled auto-snapshot run.
pub(super) async fn auto_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = auto_snapshot::run_auto_snapshot(state.store.as_ref()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Auto snapshot saved successfully",
        "snapshotId": snapshot.id,
        "provenance": snapshot.provenance,
        "totals": {
            "totalActive": snapshot.total_active,
            "totalExpired": snapshot.total_expired,
            "totalDealers": snapshot.total_dealer_count,
        },
    })))
}

/// DELETE /api/snapshots/{id}
pub(super) async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_snapshot_id(&id)?.to_string();
    if !state.store.delete(&id).await? {
        return Err(AppError::NotFound(format!("snapshot {id} not found")));
    }
    tracing::info!(snapshot_id = %id, "snapshot deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/snapshots/{id}/download: pretty-printed JSON attachment.
pub(super) async fn download_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(stored) = state.store.get(&id).await? else {
        return Err(AppError::NotFound(format!("snapshot {id} not found")));
    };
    let download = DownloadedSnapshot::new(stored.snapshot, Utc::now());
    let body = download
        .to_json_pretty()
        .map_err(|e| AppError::Store(StoreError::Serialize(e)))?;
    let disposition = format!("attachment; filename=\"{}\"", download.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// GET /api/snapshots/dates: distinct snapshot dates (UTC), newest first.
pub(super) async fn dates_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let snapshots = state.store.list(state.config.database.list_limit).await?;
    Ok(Json(comparison::available_dates(&snapshots)))
}

/// Snapshots to pick a historical day from: every snapshot on `requested`, or the
/// newest listed ones when no date was asked for.
async fn history_candidates(
    state: &AppState,
    requested: Option<NaiveDate>,
) -> Result<Vec<StoredSnapshot>, AppError> {
    let snapshots = match requested {
        Some(date) => state.store.created_on(date).await?,
        None => state.store.list(state.config.database.list_limit).await?,
    };
    if snapshots.is_empty() {
        return Err(AppError::NotFound(match requested {
            Some(date) => format!("no snapshot on {date}"),
            None => "no snapshots saved yet".into(),
        }));
    }
    Ok(snapshots)
}

/// GET /api/history?date=YYYY-MM-DD: summary of the newest snapshot on that date.
pub(super) async fn history_handler(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let requested = parse_date(params.date.as_deref())?;
    let snapshots = history_candidates(&state, requested).await?;
    let Some(date) = requested.or_else(|| comparison::available_dates(&snapshots).first().copied())
    else {
        return Err(AppError::NotFound("no snapshots saved yet".into()));
    };
    let Some(stored) = comparison::snapshot_for_date(&snapshots, date) else {
        return Err(AppError::NotFound(format!("no snapshot on {date}")));
    };

    let records = stored.snapshot.records();
    let combined = aggregation::combine_dealers(&records.active, &records.expired);
    Ok(Json(json!({
        "date": date,
        "snapshotId": stored.snapshot.id,
        "kind": stored.snapshot.kind,
        "provenance": stored.snapshot.provenance,
        "createdAt": stored.snapshot.created_at,
        "hasDataIssues": stored.has_data_issues,
        "dataIssues": stored.data_issues,
        "summary": aggregation::summarize(&records),
        "zones": aggregation::combined_zone_summaries(&combined),
        "highRisk": aggregation::high_expired_dealers(&records.expired),
    })))
}

/// GET /api/compare?date=YYYY-MM-DD&mode=active|expired: live data against a snapshot.
pub(super) async fn compare_handler(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(params.date.as_deref())?;
    let mode = parse_mode(params.mode.as_deref())?;
    let snapshots = history_candidates(&state, date).await?;
    let live = state.current_data().await?;
    let Some(comparison) = comparison::compare_with_history(&live.records, &snapshots, date, mode)
    else {
        return Err(AppError::NotFound("no snapshot for the requested date".into()));
    };
    Ok(Json(comparison))
}
