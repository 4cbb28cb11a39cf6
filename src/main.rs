//! # Traffic Manager Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use traffic_manager::{
    config::ConfigLoader,
    crypto::CryptoKey,
    db,
    repositories::AdAccountRepository,
    scheduler::SyncScheduler,
    server::{AppState, run_server},
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "traffic-manager", version, about = "Traffic Manager API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Run automatic sync once for every due account and exit
    SyncOnce,
    /// Encrypt access tokens still stored as plaintext
    ReencryptTokens,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    init_tracing(&config).context("initializing tracing")?;

    info!(profile = %config.profile, "Configuration loaded");
    if let Ok(redacted) = config.redacted_json() {
        tracing::debug!(config = %redacted, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;
    db::run_migrations(&db).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::SyncOnce => {
            let state = AppState::from_config(config, db)?;
            let report = state.orchestrator.run_due().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::ReencryptTokens => {
            let key_bytes = config
                .crypto_key
                .clone()
                .context("crypto key not present in configuration")?;
            let crypto_key = CryptoKey::new(key_bytes).context("initializing crypto key")?;
            let rewritten = AdAccountRepository::new(Arc::new(db), crypto_key)
                .reencrypt_plaintext_tokens()
                .await?;
            println!("Re-encrypted {rewritten} ad account(s) holding plaintext tokens.");
            Ok(())
        }
    }
}

async fn serve(
    config: traffic_manager::config::AppConfig,
    db: sea_orm::DatabaseConnection,
) -> anyhow::Result<()> {
    let scheduler_config = config.scheduler.clone();
    let state = AppState::from_config(config, db)?;
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    let scheduler_handle = scheduler_config.enabled.then(|| {
        let scheduler = SyncScheduler::new(
            state.orchestrator.clone(),
            scheduler_config.tick_interval_seconds,
        );
        tokio::spawn(scheduler.run(shutdown.child_token()))
    });

    let served = run_server(state, shutdown.clone()).await;
    shutdown.cancel();

    if let Some(handle) = scheduler_handle
        && let Err(err) = handle.await
    {
        error!(error = %err, "Sync scheduler task failed");
    }

    served
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
