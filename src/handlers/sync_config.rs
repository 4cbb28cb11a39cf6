//! # Automatic Sync Settings Handlers
//!
//! A manager without a settings row sees the defaults: automatic sync off,
//! the configured default interval, nothing scheduled.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::ManagerSession;
use crate::error::ApiError;
use crate::models::sync_config;
use crate::repositories::{SyncConfigRepository, SyncSettingsUpdate};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncSettings {
    pub sync_automatico: bool,
    /// Hours between automatic runs (1-168)
    pub intervalo_horas: i32,
    pub proxima_execucao: Option<DateTime<FixedOffset>>,
    pub ultima_execucao: Option<DateTime<FixedOffset>>,
}

impl From<sync_config::Model> for SyncSettings {
    fn from(model: sync_config::Model) -> Self {
        Self {
            sync_automatico: model.sync_automatico,
            intervalo_horas: model.intervalo_horas,
            proxima_execucao: model.proxima_execucao,
            ultima_execucao: model.ultima_execucao,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSyncSettingsRequest {
    #[serde(default)]
    pub sync_automatico: Option<bool>,
    #[serde(default)]
    pub intervalo_horas: Option<i32>,
}

/// Returns the caller's automatic sync settings
#[utoipa::path(
    get,
    path = "/api/sync/config",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current settings", body = SyncSettings),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn get_sync_settings(
    State(state): State<AppState>,
    session: ManagerSession,
) -> Result<Json<SyncSettings>, ApiError> {
    let settings = SyncConfigRepository::new(state.db.clone())
        .find_for_manager(session.gestor_id)
        .await?
        .map(SyncSettings::from)
        .unwrap_or(SyncSettings {
            sync_automatico: false,
            intervalo_horas: state.config.scheduler.default_interval_hours,
            proxima_execucao: None,
            ultima_execucao: None,
        });

    Ok(Json(settings))
}

/// Turns automatic sync on or off and sets its interval
#[utoipa::path(
    put,
    path = "/api/sync/config",
    security(("bearer_auth" = [])),
    request_body = UpdateSyncSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = SyncSettings),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn update_sync_settings(
    State(state): State<AppState>,
    session: ManagerSession,
    payload: Result<Json<UpdateSyncSettingsRequest>, JsonRejection>,
) -> Result<Json<SyncSettings>, ApiError> {
    let Json(request) = payload?;

    let saved = SyncConfigRepository::new(state.db.clone())
        .save_for_manager(
            session.gestor_id,
            SyncSettingsUpdate {
                sync_automatico: request.sync_automatico,
                intervalo_horas: request.intervalo_horas,
            },
            state.config.scheduler.default_interval_hours,
        )
        .await?;

    tracing::info!(
        gestor_id = %session.gestor_id,
        enabled = saved.sync_automatico,
        interval_hours = saved.intervalo_horas,
        "Automatic sync settings saved"
    );
    Ok(Json(saved.into()))
}
