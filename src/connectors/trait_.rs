//! Ads connector trait definition
//!
//! The sync layer talks to the ads provider only through [`AdsConnector`], so
//! the Graph API client can be swapped for a fake in tests.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failures talking to the Meta Marketing API.
#[derive(Debug, Clone, Error)]
pub enum MetaApiError {
    /// The provider answered with an `{"error": {...}}` envelope
    #[error("{message}")]
    Provider {
        message: String,
        code: Option<i64>,
        error_type: Option<String>,
    },
    /// Non-success status without a provider error envelope
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MetaApiError {
    /// Provider error code, when the envelope carried one
    pub fn provider_code(&self) -> Option<i64> {
        match self {
            MetaApiError::Provider { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MetaApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MetaApiError::Malformed(err.to_string())
        } else {
            MetaApiError::Network(err.to_string())
        }
    }
}

/// Graph API list wrapper (`{"data": [...]}`); only the first page is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Campaign record as returned by `act_{id}/campaigns`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCampaign {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    /// Nested 30-day aggregate, absent for campaigns without delivery
    #[serde(default)]
    pub insights: Option<GraphList<RawInsight>>,
}

/// Insight record. Numeric fields usually arrive as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInsight {
    #[serde(default)]
    pub date_start: Option<String>,
    #[serde(default)]
    pub date_stop: Option<String>,
    #[serde(default)]
    pub spend: Option<Value>,
    #[serde(default)]
    pub reach: Option<Value>,
    #[serde(default)]
    pub impressions: Option<Value>,
    #[serde(default)]
    pub clicks: Option<Value>,
    #[serde(default)]
    pub ctr: Option<Value>,
    #[serde(default)]
    pub cpc: Option<Value>,
    #[serde(default)]
    pub cpm: Option<Value>,
}

/// Result of exchanging a short-lived user token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangedToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Inclusive date range requested from the insights endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl InsightWindow {
    /// Lookback window used by every sync.
    pub const LOOKBACK_DAYS: i64 = 30;

    /// Window of `days` ending on `until`.
    pub fn trailing_days(until: NaiveDate, days: i64) -> Self {
        Self {
            since: until - Duration::days(days),
            until,
        }
    }

    /// The default trailing window ending on `today`.
    pub fn ending(today: NaiveDate) -> Self {
        Self::trailing_days(today, Self::LOOKBACK_DAYS)
    }

    /// `time_range` query value, e.g. `{"since":"2024-01-01","until":"2024-01-31"}`
    pub fn to_time_range(&self) -> String {
        serde_json::json!({
            "since": self.since.format("%Y-%m-%d").to_string(),
            "until": self.until.format("%Y-%m-%d").to_string(),
        })
        .to_string()
    }
}

#[async_trait]
pub trait AdsConnector: Send + Sync {
    /// Campaigns of an ad account (numeric id, without `act_`), with a nested
    /// 30-day aggregate.
    async fn fetch_campaigns(
        &self,
        account_external_id: &str,
        access_token: &str,
    ) -> Result<Vec<RawCampaign>, MetaApiError>;

    /// Per-day insights of a campaign over `window`.
    async fn fetch_daily_insights(
        &self,
        campaign_external_id: &str,
        access_token: &str,
        window: InsightWindow,
    ) -> Result<Vec<RawInsight>, MetaApiError>;

    /// Exchange a short-lived user token for a long-lived one.
    async fn exchange_long_lived_token(
        &self,
        short_lived_token: &str,
    ) -> Result<ExchangedToken, MetaApiError>;
}
