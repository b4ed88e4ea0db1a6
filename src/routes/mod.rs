// HTTP routes: dashboard views over live sheet data, snapshot history, comparisons

mod http;
mod snapshots;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::poller::{self, FeedState, LiveData};
use crate::sheet::SheetSource;
use crate::snapshot_repo::SnapshotStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<dyn SnapshotStore>,
    pub(crate) source: Arc<dyn SheetSource>,
    pub(crate) live: watch::Receiver<FeedState>,
    pub(crate) config: AppConfig,
}

impl AppState {
    /// Latest data published by the poller; one fresh fetch when it has none.
    pub(crate) async fn current_data(&self) -> Result<Arc<LiveData>, AppError> {
        let published = self.live.borrow().ready();
        if let Some(live) = published {
            return Ok(live);
        }
        self.fresh_data().await
    }

    /// Always fetches, ignoring what the poller published.
    pub(crate) async fn fresh_data(&self) -> Result<Arc<LiveData>, AppError> {
        poller::refresh(self.source.as_ref())
            .await
            .map(Arc::new)
            .map_err(|e| {
                tracing::warn!(error = %e, "on-demand sheet fetch failed");
                AppError::SourceUnavailable(e.to_string())
            })
    }
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("sheet data unavailable: {0}")]
    SourceUnavailable(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidId(_) => AppError::BadRequest(e.to_string()),
            other => AppError::Store(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, retryable) = match &self {
            AppError::SourceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, true),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, false),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, false),
            AppError::Store(e) => {
                tracing::error!(error = %e, "snapshot store error");
                (StatusCode::INTERNAL_SERVER_ERROR, true)
            }
        };
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "retryable": retryable,
        }));
        (status, body).into_response()
    }
}

pub fn app(
    store: Arc<dyn SnapshotStore>,
    source: Arc<dyn SheetSource>,
    live: watch::Receiver<FeedState>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        store,
        source,
        live,
        config,
    };
    Router::new()
        .route("/", get(|| async { "dealerboard: dealer dashboard API" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/summary", get(http::summary_handler)) // GET /api/summary
        .route("/api/dealers/active", get(http::active_dealers_handler)) // GET /api/dealers/active
        .route("/api/dealers/expired", get(http::expired_dealers_handler)) // GET /api/dealers/expired
        .route(
            "/api/snapshots",
            get(snapshots::list_handler).post(snapshots::create_handler),
        ) // GET, POST /api/snapshots
        .route("/api/snapshots/auto", post(snapshots::auto_handler)) // POST /api/snapshots/auto
        .route("/api/snapshots/dates", get(snapshots::dates_handler)) // GET /api/snapshots/dates
        .route("/api/snapshots/{id}", delete(snapshots::delete_handler)) // DELETE /api/snapshots/{id}
        .route(
            "/api/snapshots/{id}/download",
            get(snapshots::download_handler),
        ) // GET /api/snapshots/{id}/download
        .route("/api/history", get(snapshots::history_handler)) // GET /api/history
        .route("/api/compare", get(snapshots::compare_handler)) // GET /api/compare
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
