//! Meta Marketing Graph API client
//!
//! Single-attempt GET requests for campaigns and daily insights of an ad
//! account, plus the long-lived token exchange. An `{"error": {...}}` envelope
//! is terminal for the request and its message is surfaced unchanged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use metrics::{counter, histogram};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};
use url::Url;

use super::trait_::{
    AdsConnector, ExchangedToken, GraphList, InsightWindow, MetaApiError, RawCampaign, RawInsight,
};
use crate::config::AppConfig;

type HmacSha256 = Hmac<Sha256>;

const CAMPAIGN_FIELDS: &str =
    "id,name,status,objective,insights.date_preset(last_30d){spend,reach,impressions,clicks,ctr}";
const INSIGHT_FIELDS: &str = "date_start,date_stop,spend,impressions,clicks,ctr,cpc,cpm";

/// Meta client settings
#[derive(Debug, Clone)]
pub struct MetaClientConfig {
    pub graph_base: String,
    pub api_version: String,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub timeout: Duration,
}

impl MetaClientConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            graph_base: config.meta_graph_base.clone(),
            api_version: config.meta_api_version.clone(),
            app_id: config.meta_app_id.clone(),
            app_secret: config.meta_app_secret.clone(),
            timeout: Duration::from_secs(config.meta_request_timeout_seconds),
        }
    }
}

#[derive(Clone)]
pub struct MetaAdsClient {
    http: reqwest::Client,
    config: MetaClientConfig,
}

impl MetaAdsClient {
    pub fn new(config: MetaClientConfig) -> Result<Self, MetaApiError> {
        Url::parse(&config.graph_base).map_err(|e| {
            MetaApiError::Configuration(format!(
                "invalid graph base '{}': {}",
                config.graph_base, e
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("traffic-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MetaApiError::Configuration(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, MetaApiError> {
        Self::new(MetaClientConfig::from_app_config(config))
    }

    fn endpoint(&self, path: &str) -> Result<Url, MetaApiError> {
        let raw = format!(
            "{}/{}/{}",
            self.config.graph_base.trim_end_matches('/'),
            self.config.api_version,
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| MetaApiError::Configuration(format!("invalid url {raw}: {e}")))
    }

    /// hex(HMAC-SHA256(app_secret, access_token)) when the app secret is known
    fn appsecret_proof(&self, access_token: &str) -> Option<String> {
        let secret = self.config.app_secret.as_deref()?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(access_token.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    fn authorize(&self, url: &mut Url, access_token: &str) {
        let proof = self.appsecret_proof(access_token);
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("access_token", access_token);
        if let Some(proof) = proof {
            pairs.append_pair("appsecret_proof", &proof);
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Url,
    ) -> Result<T, MetaApiError> {
        let started = Instant::now();
        let result = self.send(url).await;

        histogram!("meta_api_request_duration_ms", "endpoint" => endpoint)
            .record(started.elapsed().as_millis() as f64);
        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!("meta_api_requests_total", "endpoint" => endpoint, "outcome" => outcome)
            .increment(1);

        let body = result?;
        serde_json::from_value(body).map_err(|e| MetaApiError::Malformed(e.to_string()))
    }

    async fn send(&self, url: Url) -> Result<Value, MetaApiError> {
        debug!(path = %url.path(), "Meta Graph API request");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body: Option<Value> = serde_json::from_str(&text).ok();

        if let Some(error) = body.as_ref().and_then(|b| b.get("error")).filter(|e| e.is_object()) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Meta API error")
                .to_string();
            let code = error.get("code").and_then(Value::as_i64);
            let error_type = error.get("type").and_then(Value::as_str).map(str::to_string);

            warn!(status = status.as_u16(), ?code, %message, "Meta Graph API returned an error");
            return Err(MetaApiError::Provider {
                message,
                code,
                error_type,
            });
        }

        if !status.is_success() {
            warn!(status = status.as_u16(), "Meta Graph API request failed");
            return Err(MetaApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        body.ok_or_else(|| MetaApiError::Malformed("response body is not JSON".to_string()))
    }
}

#[async_trait]
impl AdsConnector for MetaAdsClient {
    async fn fetch_campaigns(
        &self,
        account_external_id: &str,
        access_token: &str,
    ) -> Result<Vec<RawCampaign>, MetaApiError> {
        let account = account_external_id.trim_start_matches("act_");
        let mut url = self.endpoint(&format!("act_{account}/campaigns"))?;
        url.query_pairs_mut().append_pair("fields", CAMPAIGN_FIELDS);
        self.authorize(&mut url, access_token);

        let list: GraphList<RawCampaign> = self.get_json("campaigns", url).await?;
        Ok(list.data)
    }

    async fn fetch_daily_insights(
        &self,
        campaign_external_id: &str,
        access_token: &str,
        window: InsightWindow,
    ) -> Result<Vec<RawInsight>, MetaApiError> {
        let mut url = self.endpoint(&format!("{campaign_external_id}/insights"))?;
        url.query_pairs_mut()
            .append_pair("fields", INSIGHT_FIELDS)
            .append_pair("time_increment", "1")
            .append_pair("time_range", &window.to_time_range());
        self.authorize(&mut url, access_token);

        let list: GraphList<RawInsight> = self.get_json("insights", url).await?;
        Ok(list.data)
    }

    async fn exchange_long_lived_token(
        &self,
        short_lived_token: &str,
    ) -> Result<ExchangedToken, MetaApiError> {
        let (Some(app_id), Some(app_secret)) =
            (self.config.app_id.as_deref(), self.config.app_secret.as_deref())
        else {
            return Err(MetaApiError::Configuration(
                "Meta app id and secret are required for token exchange".to_string(),
            ));
        };

        let mut url = self.endpoint("oauth/access_token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "fb_exchange_token")
            .append_pair("client_id", app_id)
            .append_pair("client_secret", app_secret)
            .append_pair("fb_exchange_token", short_lived_token);

        self.get_json("token_exchange", url).await
    }
}
