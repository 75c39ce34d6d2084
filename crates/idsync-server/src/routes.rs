use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use idsync_core::sync::{SyncStatus, SyncStatusSnapshot};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    sync_status: SyncStatus,
}

impl AppState {
    pub const fn new(config: Arc<AppConfig>, sync_status: SyncStatus) -> Self {
        Self {
            config,
            sync_status,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/sync/status", get(sync_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    poll_interval_minutes: u64,
    sync: SyncStatusSnapshot,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let sync = state.sync_status.snapshot().await;
    Json(HealthResponse {
        status: health_label(&sync),
        timestamp: Utc::now().timestamp(),
        poll_interval_minutes: state.config.engine.poll_interval_minutes,
        sync,
    })
}

async fn sync_status(State(state): State<AppState>) -> Json<SyncStatusSnapshot> {
    Json(state.sync_status.snapshot().await)
}

/// `degraded` when the most recent finished cycle failed.
fn health_label(sync: &SyncStatusSnapshot) -> &'static str {
    match (sync.last_success_at, sync.last_failure_at) {
        (_, None) => "ok",
        (Some(success), Some(failure)) if success >= failure => "ok",
        _ => "degraded",
    }
}
