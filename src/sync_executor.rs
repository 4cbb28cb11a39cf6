//! Sync Executor
//!
//! Per-account synchronization: fetch campaigns and daily insights through the
//! [`AdsConnector`], normalize them and upsert them. Used directly by the
//! manual sync endpoints and, account by account, by the orchestrator.

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::config::MetricsConfig;
use crate::connectors::{AdsConnector, InsightWindow, MetaApiError};
use crate::crypto::CryptoKey;
use crate::error::{ApiError, RepositoryError, not_found, provider_error};
use crate::models::{ad_account, campaign};
use crate::normalization::{NormalizedDailyMetric, normalize_campaign, normalize_insight};
use crate::notifier::{AlertContext, AlertEvaluator};
use crate::repositories::{AdAccountRepository, CampaignRepository, DailyMetricRepository};

/// Why a sync of one account or campaign did not complete
#[derive(Debug, Error)]
pub enum SyncFailure {
    #[error("Ad account not found")]
    AccountNotFound,
    #[error("Campaign not found")]
    CampaignNotFound,
    #[error("Access token not found for ad account")]
    MissingToken,
    #[error("{0}")]
    Provider(#[from] MetaApiError),
    #[error("{0}")]
    Store(#[from] RepositoryError),
}

impl From<SyncFailure> for ApiError {
    fn from(failure: SyncFailure) -> Self {
        match failure {
            SyncFailure::AccountNotFound
            | SyncFailure::CampaignNotFound
            | SyncFailure::MissingToken => not_found(failure.to_string()),
            SyncFailure::Provider(err) => provider_error(err.to_string(), err.provider_code()),
            SyncFailure::Store(RepositoryError::Database(db_err)) => {
                tracing::error!(error = %db_err, "Sync write failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SYNC_WRITE_FAILED",
                    db_err.to_string(),
                )
            }
            SyncFailure::Store(other) => other.into(),
        }
    }
}

/// `{success: true, campaigns}`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignSyncOutcome {
    pub success: bool,
    pub campaigns: usize,
}

/// `{success: true, metrics_synchronized, skipped?}`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSyncOutcome {
    pub success: bool,
    pub metrics_synchronized: usize,
    /// Set when fresh metrics made the provider call unnecessary
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

/// Success payload of a full account sync
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountSyncSummary {
    pub success: bool,
    pub campaigns: usize,
    pub metrics_synchronized: usize,
}

pub struct SyncExecutor {
    pub db: Arc<DatabaseConnection>,
    connector: Arc<dyn AdsConnector>,
    alerts: Arc<dyn AlertEvaluator>,
    accounts: AdAccountRepository,
    campaigns: CampaignRepository,
    daily_metrics: DailyMetricRepository,
    settings: MetricsConfig,
}

impl SyncExecutor {
    pub fn new(
        db: Arc<DatabaseConnection>,
        crypto_key: CryptoKey,
        connector: Arc<dyn AdsConnector>,
        alerts: Arc<dyn AlertEvaluator>,
        settings: MetricsConfig,
    ) -> Self {
        Self {
            accounts: AdAccountRepository::new(db.clone(), crypto_key),
            campaigns: CampaignRepository::new(db.clone()),
            daily_metrics: DailyMetricRepository::new(db.clone()),
            db,
            connector,
            alerts,
            settings,
        }
    }

    fn access_token(&self, account: &ad_account::Model) -> Result<String, SyncFailure> {
        self.accounts
            .access_token(account)?
            .ok_or(SyncFailure::MissingToken)
    }

    /// Pull the account's campaigns and upsert them.
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    pub async fn sync_campaigns(
        &self,
        account: &ad_account::Model,
    ) -> Result<CampaignSyncOutcome, SyncFailure> {
        let started = Instant::now();
        let result = self.fetch_and_store_campaigns(account).await;

        histogram!("sync_campaigns_duration_ms").record(started.elapsed().as_millis() as f64);
        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!("sync_campaigns_total", "outcome" => outcome).increment(1);

        let campaigns = result?;
        info!(campaigns, "Campaigns synchronized");
        Ok(CampaignSyncOutcome {
            success: true,
            campaigns,
        })
    }

    async fn fetch_and_store_campaigns(
        &self,
        account: &ad_account::Model,
    ) -> Result<usize, SyncFailure> {
        let token = self.access_token(account)?;
        let raw = self
            .connector
            .fetch_campaigns(&account.id_conta_externa, &token)
            .await?;

        let normalized: Vec<_> = raw.iter().map(normalize_campaign).collect();
        Ok(self
            .campaigns
            .upsert_for_account(account.id, &normalized)
            .await?)
    }

    /// Pull the campaign's daily insights for the trailing window and upsert
    /// them. Unless `force` is set, metrics written within the freshness
    /// window are left alone and no provider call is made.
    #[instrument(skip(self, account, campaign), fields(campaign_id = %campaign.id))]
    pub async fn sync_metrics(
        &self,
        account: &ad_account::Model,
        campaign: &campaign::Model,
        force: bool,
    ) -> Result<MetricsSyncOutcome, SyncFailure> {
        if !force && self.metrics_are_fresh(campaign).await? {
            debug!("Metrics are fresh, skipping provider call");
            counter!("sync_metrics_total", "outcome" => "skipped").increment(1);
            return Ok(MetricsSyncOutcome {
                success: true,
                metrics_synchronized: 0,
                skipped: true,
            });
        }

        let started = Instant::now();
        let result = self.fetch_and_store_metrics(account, campaign).await;

        histogram!("sync_metrics_duration_ms").record(started.elapsed().as_millis() as f64);
        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!("sync_metrics_total", "outcome" => outcome).increment(1);

        let metrics = result?;
        self.evaluate_alerts(account, campaign, &metrics).await;

        Ok(MetricsSyncOutcome {
            success: true,
            metrics_synchronized: metrics.len(),
            skipped: false,
        })
    }

    async fn metrics_are_fresh(&self, campaign: &campaign::Model) -> Result<bool, SyncFailure> {
        if self.settings.freshness_minutes == 0 {
            return Ok(false);
        }

        let Some(last_written) = self.daily_metrics.last_written_at(campaign.id).await? else {
            return Ok(false);
        };

        let window = Duration::minutes(self.settings.freshness_minutes as i64);
        Ok(Utc::now().fixed_offset() - last_written < window)
    }

    async fn fetch_and_store_metrics(
        &self,
        account: &ad_account::Model,
        campaign: &campaign::Model,
    ) -> Result<Vec<NormalizedDailyMetric>, SyncFailure> {
        let token = self.access_token(account)?;
        let window = InsightWindow::ending(Utc::now().date_naive());

        let raw = self
            .connector
            .fetch_daily_insights(&campaign.id_externo, &token, window)
            .await?;

        let metrics: Vec<_> = raw
            .iter()
            .filter_map(|insight| normalize_insight(insight, self.settings.leads_click_ratio))
            .collect();

        if metrics.len() < raw.len() {
            warn!(
                dropped = raw.len() - metrics.len(),
                "Insight records without a usable date were dropped"
            );
        }

        self.daily_metrics
            .upsert_for_campaign(campaign.id, &metrics)
            .await?;

        Ok(metrics)
    }

    /// Failures are logged only; the metrics are already committed.
    async fn evaluate_alerts(
        &self,
        account: &ad_account::Model,
        campaign: &campaign::Model,
        metrics: &[NormalizedDailyMetric],
    ) {
        if metrics.is_empty() {
            return;
        }

        let context = AlertContext {
            campanha_id: campaign.id,
            gestor_id: account.gestor_id,
            metricas: metrics,
        };

        if let Err(err) = self.alerts.evaluate(context).await {
            counter!("alert_evaluation_failures_total").increment(1);
            warn!(error = %err, campaign_id = %campaign.id, "Alert evaluation failed");
        }
    }

    /// Campaigns followed by the metrics of every campaign of the account.
    /// The caller has already decided the account is due, so metrics are
    /// always refetched.
    pub async fn sync_account(
        &self,
        account: &ad_account::Model,
    ) -> Result<AccountSyncSummary, SyncFailure> {
        let campaigns = self.sync_campaigns(account).await?.campaigns;

        let mut metrics_synchronized = 0;
        for campaign in self.campaigns.list_for_account(account.id).await? {
            metrics_synchronized += self
                .sync_metrics(account, &campaign, true)
                .await?
                .metrics_synchronized;
        }

        Ok(AccountSyncSummary {
            success: true,
            campaigns,
            metrics_synchronized,
        })
    }
}
