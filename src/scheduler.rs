//! # Sync Orchestration
//!
//! [`SyncOrchestrator`] fans out over every active account of every manager
//! with automatic sync enabled and due, syncing one account at a time. A
//! failing account is recorded in the result list and never stops the run.
//! [`SyncScheduler`] drives the orchestrator on a fixed tick until shutdown.
//!
//! Only one run may be in flight per process; concurrent runs across
//! processes are not coordinated.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use metrics::{counter, gauge, histogram};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::crypto::CryptoKey;
use crate::error::{ApiError, RepositoryError};
use crate::repositories::{AdAccountRepository, SyncConfigRepository};
use crate::sync_executor::{AccountSyncSummary, SyncExecutor};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("An automatic sync is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::AlreadyRunning => {
                ApiError::new(StatusCode::CONFLICT, "SYNC_IN_PROGRESS", err.to_string())
            }
            OrchestratorError::Store(inner) => inner.into(),
        }
    }
}

/// Outcome of one account: the success payload or `{success: false, error}`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AccountResult {
    Synced(AccountSyncSummary),
    Failed { success: bool, error: String },
}

impl AccountResult {
    fn failed(message: String) -> Self {
        AccountResult::Failed {
            success: false,
            error: message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AccountResult::Synced(_))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountSyncResult {
    pub account_id: Uuid,
    pub result: AccountResult,
}

/// `{success, message, resultados}`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SyncRunReport {
    pub success: bool,
    pub message: String,
    pub resultados: Vec<AccountSyncResult>,
}

pub struct SyncOrchestrator {
    executor: Arc<SyncExecutor>,
    accounts: AdAccountRepository,
    settings: SyncConfigRepository,
    in_flight: Mutex<()>,
}

impl SyncOrchestrator {
    pub fn new(
        db: Arc<DatabaseConnection>,
        crypto_key: CryptoKey,
        executor: Arc<SyncExecutor>,
    ) -> Self {
        Self {
            accounts: AdAccountRepository::new(db.clone(), crypto_key),
            settings: SyncConfigRepository::new(db),
            executor,
            in_flight: Mutex::new(()),
        }
    }

    /// Sync every due account once. Returns [`OrchestratorError::AlreadyRunning`]
    /// instead of waiting when another run holds the guard.
    #[instrument(skip_all)]
    pub async fn run_due(&self) -> Result<SyncRunReport, OrchestratorError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            counter!("sync_runs_rejected_total").increment(1);
            return Err(OrchestratorError::AlreadyRunning);
        };

        let started = Instant::now();
        let now = Utc::now().fixed_offset();
        let mut resultados = Vec::new();
        let mut managers_processed = 0u64;

        for config in self.settings.list_enabled().await? {
            if !config.is_due(now) {
                debug!(gestor_id = %config.gestor_id, "Automatic sync not due yet");
                continue;
            }

            let gestor_id = config.gestor_id;
            match self.accounts.list_active_for_manager(gestor_id).await {
                Ok(accounts) => {
                    for account in accounts {
                        let result = match self.executor.sync_account(&account).await {
                            Ok(summary) => AccountResult::Synced(summary),
                            Err(err) => {
                                warn!(
                                    account_id = %account.id,
                                    error = %err,
                                    "Account sync failed"
                                );
                                AccountResult::failed(err.to_string())
                            }
                        };
                        resultados.push(AccountSyncResult {
                            account_id: account.id,
                            result,
                        });
                    }
                }
                Err(err) => {
                    error!(
                        gestor_id = %gestor_id,
                        error = %err,
                        "Failed to load accounts for manager"
                    );
                    continue;
                }
            }

            if let Err(err) = self.settings.record_run(config, now).await {
                error!(
                    gestor_id = %gestor_id,
                    error = %err,
                    "Failed to schedule next automatic sync"
                );
            }
            managers_processed += 1;
        }

        let succeeded = resultados.iter().filter(|r| r.result.is_success()).count();
        let failed = resultados.len() - succeeded;

        counter!("sync_accounts_succeeded_total").increment(succeeded as u64);
        counter!("sync_accounts_failed_total").increment(failed as u64);
        gauge!("sync_last_run_managers").set(managers_processed as f64);
        histogram!("sync_run_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);

        info!(
            managers = managers_processed,
            accounts = resultados.len(),
            succeeded,
            failed,
            "Automatic sync finished"
        );

        Ok(SyncRunReport {
            success: true,
            message: format!(
                "Automatic sync processed {} account(s): {} succeeded, {} failed",
                resultados.len(),
                succeeded,
                failed
            ),
            resultados,
        })
    }
}

/// Background loop invoking the orchestrator every tick.
pub struct SyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    tick_interval: Duration,
}

impl SyncScheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, tick_interval_seconds: u64) -> Self {
        Self {
            orchestrator,
            tick_interval: Duration::from_secs(tick_interval_seconds),
        }
    }

    /// Run until `shutdown` fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(tick_seconds = self.tick_interval.as_secs(), "Starting sync scheduler");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sync scheduler shutdown requested");
                    break;
                }
                _ = sleep(self.tick_interval) => {
                    match self.orchestrator.run_due().await {
                        Ok(report) => {
                            debug!(accounts = report.resultados.len(), "Scheduler tick completed")
                        }
                        Err(OrchestratorError::AlreadyRunning) => {
                            debug!("Previous automatic sync still running, skipping tick");
                        }
                        Err(err) => error!(error = %err, "Scheduler tick failed"),
                    }
                }
            }
        }

        info!("Sync scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_serializes_as_error_payload() {
        let value = serde_json::to_value(AccountSyncResult {
            account_id: Uuid::nil(),
            result: AccountResult::failed("Invalid OAuth access token".to_string()),
        })
        .unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "account_id": "00000000-0000-0000-0000-000000000000",
                "result": {"success": false, "error": "Invalid OAuth access token"}
            })
        );
    }

    #[test]
    fn synced_result_serializes_summary() {
        let value = serde_json::to_value(AccountResult::Synced(AccountSyncSummary {
            success: true,
            campaigns: 3,
            metrics_synchronized: 90,
        }))
        .unwrap();

        assert_eq!(
            value,
            serde_json::json!({"success": true, "campaigns": 3, "metrics_synchronized": 90})
        );
    }

    #[test]
    fn already_running_maps_to_conflict() {
        let api: ApiError = OrchestratorError::AlreadyRunning.into();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.code, Box::from("SYNC_IN_PROGRESS"));
    }
}
