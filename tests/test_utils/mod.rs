//! Test utilities for database and router testing.
//!
//! In-memory SQLite with migrations applied, a scriptable ads connector and
//! helpers for issuing authenticated requests against the router.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use tokio::sync::Notify;
use tower::ServiceExt;
use uuid::Uuid;

use traffic_manager::auth::SessionClaims;
use traffic_manager::config::AppConfig;
use traffic_manager::connectors::{
    AdsConnector, ExchangedToken, GraphList, InsightWindow, MetaApiError, RawCampaign, RawInsight,
};
use traffic_manager::crypto::CryptoKey;
use traffic_manager::models::{ad_account, client};
use traffic_manager::notifier::{AlertEvaluator, NoopAlertEvaluator};
use traffic_manager::repositories::{
    AdAccountRepository, ClientRepository, ConnectAccount, NewClient,
};
use traffic_manager::server::{AppState, create_app};

pub const TEST_JWT_SECRET: &str = "integration-session-secret";
pub const TEST_KEY: [u8; 32] = [42u8; 32];

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        crypto_key: Some(TEST_KEY.to_vec()),
        auth_jwt_secret: Some(TEST_JWT_SECRET.to_string()),
        ..Default::default()
    }
}

pub fn crypto_key() -> CryptoKey {
    CryptoKey::new(TEST_KEY.to_vec()).unwrap()
}

/// Fresh database and state around `connector`.
pub async fn test_state(connector: Arc<FakeConnector>) -> AppState {
    test_state_with(test_config(), connector).await
}

pub async fn test_state_with(config: AppConfig, connector: Arc<FakeConnector>) -> AppState {
    test_state_with_alerts(config, connector, Arc::new(NoopAlertEvaluator)).await
}

pub async fn test_state_with_alerts(
    config: AppConfig,
    connector: Arc<FakeConnector>,
    alerts: Arc<dyn AlertEvaluator>,
) -> AppState {
    let db = setup_test_db().await.unwrap();
    AppState::new(config, db, connector, alerts).unwrap()
}

pub fn session_token(gestor_id: Uuid) -> String {
    let claims = SessionClaims {
        sub: gestor_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        aud: Some("authenticated".to_string()),
        email: Some("gestor@example.com".to_string()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub async fn create_client(state: &AppState, gestor_id: Uuid, nome: &str) -> client::Model {
    ClientRepository::new(state.db.clone())
        .create(
            gestor_id,
            NewClient {
                nome: nome.to_string(),
                email: None,
                empresa: None,
            },
        )
        .await
        .unwrap()
}

pub async fn connect_account(
    state: &AppState,
    gestor_id: Uuid,
    external_id: &str,
    cliente_id: Option<Uuid>,
) -> ad_account::Model {
    AdAccountRepository::new(state.db.clone(), state.crypto_key.clone())
        .connect(ConnectAccount {
            gestor_id,
            id_conta_externa: external_id.to_string(),
            nome: Some(format!("Conta {external_id}")),
            cliente_id,
            access_token: format!("token-{external_id}"),
            token_expira_em: None,
        })
        .await
        .unwrap()
}

/// Sends a request through a fresh router and returns status and JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    state: &AppState,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let app: Router = create_app(state.clone());

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

pub fn raw_campaign(id: &str, name: &str) -> RawCampaign {
    RawCampaign {
        id: id.to_string(),
        name: Some(name.to_string()),
        status: Some("ACTIVE".to_string()),
        objective: Some("OUTCOME_LEADS".to_string()),
        insights: Some(GraphList {
            data: vec![RawInsight {
                spend: Some(json!("100.50")),
                reach: Some(json!("3000")),
                impressions: Some(json!("5000")),
                clicks: Some(json!("120")),
                ctr: Some(json!("2.4")),
                ..Default::default()
            }],
        }),
    }
}

pub fn raw_insight(date: &str, spend: &str, impressions: &str, clicks: &str) -> RawInsight {
    RawInsight {
        date_start: Some(date.to_string()),
        date_stop: Some(date.to_string()),
        spend: Some(json!(spend)),
        impressions: Some(json!(impressions)),
        clicks: Some(json!(clicks)),
        ..Default::default()
    }
}

/// Scriptable [`AdsConnector`] keyed by external account / campaign id.
#[derive(Default)]
pub struct FakeConnector {
    campaigns: Mutex<HashMap<String, Result<Vec<RawCampaign>, MetaApiError>>>,
    insights: Mutex<HashMap<String, Vec<RawInsight>>>,
    pub campaign_calls: AtomicUsize,
    pub insight_calls: AtomicUsize,
    hold_campaigns: AtomicBool,
    /// Signalled when a held campaign fetch has started
    pub entered: Notify,
    /// Lets a held campaign fetch finish
    pub release: Notify,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_campaigns(&self, account_external_id: &str, campaigns: Vec<RawCampaign>) {
        self.campaigns
            .lock()
            .unwrap()
            .insert(account_external_id.to_string(), Ok(campaigns));
    }

    pub fn failing_account(&self, account_external_id: &str, message: &str) {
        self.campaigns.lock().unwrap().insert(
            account_external_id.to_string(),
            Err(MetaApiError::Provider {
                message: message.to_string(),
                code: Some(190),
                error_type: Some("OAuthException".to_string()),
            }),
        );
    }

    pub fn with_insights(&self, campaign_external_id: &str, insights: Vec<RawInsight>) {
        self.insights
            .lock()
            .unwrap()
            .insert(campaign_external_id.to_string(), insights);
    }

    /// Park every campaign fetch until [`FakeConnector::release`] is notified.
    pub fn hold_campaign_fetches(&self) {
        self.hold_campaigns.store(true, Ordering::SeqCst);
    }

    pub fn insight_calls(&self) -> usize {
        self.insight_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdsConnector for FakeConnector {
    async fn fetch_campaigns(
        &self,
        account_external_id: &str,
        _access_token: &str,
    ) -> Result<Vec<RawCampaign>, MetaApiError> {
        self.campaign_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_campaigns.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.campaigns
            .lock()
            .unwrap()
            .get(account_external_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_daily_insights(
        &self,
        campaign_external_id: &str,
        _access_token: &str,
        _window: InsightWindow,
    ) -> Result<Vec<RawInsight>, MetaApiError> {
        self.insight_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .insights
            .lock()
            .unwrap()
            .get(campaign_external_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn exchange_long_lived_token(
        &self,
        short_lived_token: &str,
    ) -> Result<ExchangedToken, MetaApiError> {
        Ok(ExchangedToken {
            access_token: format!("long-{short_lived_token}"),
            token_type: Some("bearer".to_string()),
            expires_in: Some(5_184_000),
        })
    }
}
