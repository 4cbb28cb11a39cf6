//! # Server Configuration
//!
//! Shared application state, the router and the OpenAPI document.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    handler::Handler,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::cron_auth_middleware;
use crate::config::AppConfig;
use crate::connectors::{AdsConnector, MetaAdsClient};
use crate::crypto::CryptoKey;
use crate::handlers;
use crate::notifier::{AlertEvaluator, alert_evaluator_from_config};
use crate::scheduler::SyncOrchestrator;
use crate::sync_executor::SyncExecutor;
use crate::telemetry::trace_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub crypto_key: CryptoKey,
    pub connector: Arc<dyn AdsConnector>,
    pub executor: Arc<SyncExecutor>,
    pub orchestrator: Arc<SyncOrchestrator>,
}

impl AppState {
    /// Wire the sync components around an explicit connector and alert
    /// evaluator.
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        connector: Arc<dyn AdsConnector>,
        alerts: Arc<dyn AlertEvaluator>,
    ) -> anyhow::Result<Self> {
        let key_bytes = config
            .crypto_key
            .clone()
            .context("crypto key is required to build application state")?;
        let crypto_key = CryptoKey::new(key_bytes).context("invalid crypto key")?;

        let db = Arc::new(db);
        let executor = Arc::new(SyncExecutor::new(
            db.clone(),
            crypto_key.clone(),
            connector.clone(),
            alerts,
            config.metrics.clone(),
        ));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            db.clone(),
            crypto_key.clone(),
            executor.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            db,
            crypto_key,
            connector,
            executor,
            orchestrator,
        })
    }

    /// Production wiring: Graph API client and the configured alert evaluator.
    pub fn from_config(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let connector: Arc<dyn AdsConnector> = Arc::new(
            MetaAdsClient::from_app_config(&config).context("failed to build Meta API client")?,
        );
        let alerts = alert_evaluator_from_config(&config);
        Self::new(config, db, connector, alerts)
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cron_guard = middleware::from_fn_with_state(state.config.clone(), cron_auth_middleware);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/api/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/api/meta/accounts",
            get(handlers::accounts::list_accounts).post(handlers::accounts::connect_account),
        )
        .route(
            "/api/meta/sync-campaigns",
            post(handlers::meta_sync::sync_campaigns),
        )
        .route("/api/meta/sync-metrics", post(handlers::meta_sync::sync_metrics))
        .route(
            "/api/sync/auto",
            get(handlers::auto_sync::auto_sync_status)
                .post(handlers::auto_sync::run_auto_sync.layer(cron_guard)),
        )
        .route(
            "/api/sync/config",
            get(handlers::sync_config::get_sync_settings)
                .put(handlers::sync_config::update_sync_settings),
        )
        .route(
            "/api/reports",
            get(handlers::reports::list_reports).post(handlers::reports::create_report),
        )
        .route(
            "/api/reports/{id}",
            put(handlers::reports::update_report).delete(handlers::reports::delete_report),
        )
        .route(
            "/api/public/reports/{token}",
            get(handlers::public_reports::get_public_report),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serves the API until `shutdown` is cancelled
pub async fn run_server(state: AppState, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = state
        .config
        .bind_addr()
        .with_context(|| format!("invalid bind address {}", state.config.api_bind_addr))?;
    let profile = state.config.profile.clone();

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "cron_token",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::clients::list_clients,
        crate::handlers::clients::create_client,
        crate::handlers::accounts::list_accounts,
        crate::handlers::accounts::connect_account,
        crate::handlers::meta_sync::sync_campaigns,
        crate::handlers::meta_sync::sync_metrics,
        crate::handlers::auto_sync::run_auto_sync,
        crate::handlers::auto_sync::auto_sync_status,
        crate::handlers::sync_config::get_sync_settings,
        crate::handlers::sync_config::update_sync_settings,
        crate::handlers::reports::list_reports,
        crate::handlers::reports::create_report,
        crate::handlers::reports::update_report,
        crate::handlers::reports::delete_report,
        crate::handlers::public_reports::get_public_report,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::error::ApiError,
            crate::models::client::Model,
            crate::models::campaign::Model,
            crate::models::daily_metric::Model,
            crate::models::public_report::Model,
            crate::handlers::clients::CreateClientRequest,
            crate::handlers::accounts::AccountInfo,
            crate::handlers::accounts::ConnectAccountRequest,
            crate::handlers::meta_sync::SyncCampaignsRequest,
            crate::handlers::meta_sync::SyncMetricsRequest,
            crate::sync_executor::CampaignSyncOutcome,
            crate::sync_executor::MetricsSyncOutcome,
            crate::sync_executor::AccountSyncSummary,
            crate::scheduler::SyncRunReport,
            crate::scheduler::AccountSyncResult,
            crate::scheduler::AccountResult,
            crate::handlers::auto_sync::AutoSyncStatus,
            crate::handlers::sync_config::SyncSettings,
            crate::handlers::sync_config::UpdateSyncSettingsRequest,
            crate::handlers::reports::CreateReportRequest,
            crate::handlers::reports::UpdateReportRequest,
            crate::handlers::public_reports::PublicReportView,
            crate::handlers::public_reports::ReportSummary,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "clients", description = "Manager clients"),
        (name = "accounts", description = "Connected Meta ad accounts"),
        (name = "sync", description = "Manual and automatic synchronization"),
        (name = "reports", description = "Public report management"),
        (name = "public", description = "Unauthenticated report access"),
    ),
    info(
        title = "Traffic Manager API",
        description = "Meta Ads campaign sync, metrics and public reporting for traffic managers",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_routes_and_security() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        for path in [
            "/api/meta/sync-campaigns",
            "/api/meta/sync-metrics",
            "/api/sync/auto",
            "/api/public/reports/{token}",
            "/api/reports/{id}",
        ] {
            assert!(json["paths"].get(path).is_some(), "missing {path}");
        }
        assert!(json["components"]["securitySchemes"].get("bearer_auth").is_some());
    }
}
