//! # Manual Sync Handlers
//!
//! Dashboard-triggered campaign and metric syncs for one of the caller's
//! ad accounts or campaigns. Accounts and campaigns belonging to another
//! manager are reported as not found.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ManagerSession;
use crate::error::ApiError;
use crate::repositories::{AdAccountRepository, CampaignRepository};
use crate::server::AppState;
use crate::sync_executor::{CampaignSyncOutcome, MetricsSyncOutcome, SyncFailure};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncCampaignsRequest {
    /// Internal ad account id
    pub account_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncMetricsRequest {
    /// Internal campaign id
    pub campaign_id: Uuid,
    /// Bypass the freshness window and always call the provider
    #[serde(default, rename = "forceSync")]
    pub force_sync: bool,
}

/// Pulls the account's campaigns from Meta and upserts them
#[utoipa::path(
    post,
    path = "/api/meta/sync-campaigns",
    security(("bearer_auth" = [])),
    request_body = SyncCampaignsRequest,
    responses(
        (status = 200, description = "Campaigns synchronized", body = CampaignSyncOutcome, example = json!({
            "success": true,
            "campaigns": 12
        })),
        (status = 400, description = "Provider error", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Account or access token not found", body = ApiError),
        (status = 500, description = "Failed to store campaigns", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn sync_campaigns(
    State(state): State<AppState>,
    session: ManagerSession,
    payload: Result<Json<SyncCampaignsRequest>, JsonRejection>,
) -> Result<Json<CampaignSyncOutcome>, ApiError> {
    let Json(request) = payload?;

    let accounts = AdAccountRepository::new(state.db.clone(), state.crypto_key.clone());
    let account = accounts
        .find_owned(session.gestor_id, request.account_id)
        .await?
        .ok_or(SyncFailure::AccountNotFound)?;

    let outcome = state.executor.sync_campaigns(&account).await?;
    Ok(Json(outcome))
}

/// Pulls the campaign's daily insights for the trailing 30 days and upserts them
#[utoipa::path(
    post,
    path = "/api/meta/sync-metrics",
    security(("bearer_auth" = [])),
    request_body = SyncMetricsRequest,
    responses(
        (status = 200, description = "Metrics synchronized or skipped as fresh", body = MetricsSyncOutcome, example = json!({
            "success": true,
            "metrics_synchronized": 30
        })),
        (status = 400, description = "Provider error", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Campaign, account or access token not found", body = ApiError),
        (status = 500, description = "Failed to store metrics", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn sync_metrics(
    State(state): State<AppState>,
    session: ManagerSession,
    payload: Result<Json<SyncMetricsRequest>, JsonRejection>,
) -> Result<Json<MetricsSyncOutcome>, ApiError> {
    let Json(request) = payload?;

    let campaign = CampaignRepository::new(state.db.clone())
        .find_by_id(request.campaign_id)
        .await?
        .ok_or(SyncFailure::CampaignNotFound)?;

    let account = AdAccountRepository::new(state.db.clone(), state.crypto_key.clone())
        .find_owned(session.gestor_id, campaign.conta_id)
        .await?
        .ok_or(SyncFailure::CampaignNotFound)?;

    let outcome = state
        .executor
        .sync_metrics(&account, &campaign, request.force_sync)
        .await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_sync_defaults_to_false() {
        let request: SyncMetricsRequest = serde_json::from_value(serde_json::json!({
            "campaign_id": "6f1c1e7a-2d0b-4c1e-9a57-0f8f6c1d2b3a"
        }))
        .unwrap();
        assert!(!request.force_sync);

        let request: SyncMetricsRequest = serde_json::from_value(serde_json::json!({
            "campaign_id": "6f1c1e7a-2d0b-4c1e-9a57-0f8f6c1d2b3a",
            "forceSync": true
        }))
        .unwrap();
        assert!(request.force_sync);
    }
}
