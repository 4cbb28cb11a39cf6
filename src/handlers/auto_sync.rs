//! # Automatic Sync Handlers
//!
//! Cron entry point for the orchestrator plus a liveness check.

use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::scheduler::SyncRunReport;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AutoSyncStatus {
    pub message: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Runs automatic sync for every due account
#[utoipa::path(
    post,
    path = "/api/sync/auto",
    security(("cron_token" = [])),
    responses(
        (status = 200, description = "Per-account sync results", body = SyncRunReport, example = json!({
            "success": true,
            "message": "Automatic sync processed 2 account(s): 1 succeeded, 1 failed",
            "resultados": [
                {
                    "account_id": "7a4d6a8e-9f0e-4c55-8f5e-2b2b0d9c6a11",
                    "result": {"success": true, "campaigns": 4, "metrics_synchronized": 120}
                },
                {
                    "account_id": "0d3cbd3e-3c1a-4f7a-a3c8-7b8e1d1f2e44",
                    "result": {"success": false, "error": "Invalid OAuth access token"}
                }
            ]
        })),
        (status = 401, description = "Invalid cron token", body = ApiError),
        (status = 409, description = "A run is already in progress", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn run_auto_sync(State(state): State<AppState>) -> Result<Json<SyncRunReport>, ApiError> {
    let report = state.orchestrator.run_due().await?;
    Ok(Json(report))
}

/// Liveness check for the cron trigger
#[utoipa::path(
    get,
    path = "/api/sync/auto",
    responses(
        (status = 200, description = "Endpoint is reachable", body = AutoSyncStatus)
    ),
    tag = "sync"
)]
pub async fn auto_sync_status() -> Json<AutoSyncStatus> {
    Json(AutoSyncStatus {
        message: "Automatic sync endpoint is active".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
