//! # Alert Evaluation
//!
//! After metrics are written the dashboard's notification rules are
//! evaluated against them. Evaluation failures are logged by the caller and
//! never undo the write.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::normalization::NormalizedDailyMetric;

const EVALUATION_PATH: &str = "/api/notifications/check";
const EVALUATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum AlertEvaluationError {
    #[error("alert evaluation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("alert evaluation returned status {0}")]
    Status(u16),
    #[error("invalid alert evaluation endpoint: {0}")]
    Endpoint(String),
}

/// Metrics just written for one campaign
#[derive(Debug, Clone, Serialize)]
pub struct AlertContext<'a> {
    pub campanha_id: Uuid,
    pub gestor_id: Uuid,
    pub metricas: &'a [NormalizedDailyMetric],
}

#[async_trait]
pub trait AlertEvaluator: Send + Sync {
    async fn evaluate(&self, context: AlertContext<'_>) -> Result<(), AlertEvaluationError>;
}

/// Used when no public base URL is configured.
pub struct NoopAlertEvaluator;

#[async_trait]
impl AlertEvaluator for NoopAlertEvaluator {
    async fn evaluate(&self, context: AlertContext<'_>) -> Result<(), AlertEvaluationError> {
        debug!(campanha_id = %context.campanha_id, "Alert evaluation disabled");
        Ok(())
    }
}

/// Posts the context to the dashboard's notification check endpoint.
pub struct HttpAlertEvaluator {
    client: Client,
    endpoint: Url,
}

impl HttpAlertEvaluator {
    pub fn new(public_base_url: &str) -> Result<Self, AlertEvaluationError> {
        let endpoint = Url::parse(&format!(
            "{}{}",
            public_base_url.trim_end_matches('/'),
            EVALUATION_PATH
        ))
        .map_err(|e| AlertEvaluationError::Endpoint(e.to_string()))?;

        let client = Client::builder().timeout(EVALUATION_TIMEOUT).build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl AlertEvaluator for HttpAlertEvaluator {
    async fn evaluate(&self, context: AlertContext<'_>) -> Result<(), AlertEvaluationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&context)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AlertEvaluationError::Status(response.status().as_u16()));
        }

        debug!(campanha_id = %context.campanha_id, "Alert evaluation completed");
        Ok(())
    }
}

/// HTTP evaluator when `PUBLIC_BASE_URL` is set, otherwise a no-op.
pub fn alert_evaluator_from_config(config: &AppConfig) -> Arc<dyn AlertEvaluator> {
    match config.public_base_url.as_deref() {
        Some(base) => match HttpAlertEvaluator::new(base) {
            Ok(evaluator) => Arc::new(evaluator),
            Err(err) => {
                warn!(error = %err, "Alert evaluation disabled");
                Arc::new(NoopAlertEvaluator)
            }
        },
        None => Arc::new(NoopAlertEvaluator),
    }
}
