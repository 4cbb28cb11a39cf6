//! # Repository Layer
//!
//! SeaORM data access for every entity. Each repository owns an
//! `Arc<DatabaseConnection>` handed down from `AppState`.

pub mod ad_account;
pub mod campaign;
pub mod client;
pub mod daily_metric;
pub mod public_report;
pub mod sync_config;

pub use ad_account::{AdAccountRepository, ConnectAccount};
pub use campaign::CampaignRepository;
pub use client::{ClientRepository, NewClient};
pub use daily_metric::DailyMetricRepository;
pub use public_report::{NewPublicReport, PublicReportChanges, PublicReportRepository};
pub use sync_config::{SyncConfigRepository, SyncSettingsUpdate};
