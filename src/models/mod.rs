//! # Data Models
//!
//! SeaORM entities for the Traffic Manager schema. Table and column names
//! follow the hosted Portuguese schema and double as the JSON field names.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod ad_account;
pub mod campaign;
pub mod client;
pub mod daily_metric;
pub mod public_report;
pub mod sync_config;

pub use ad_account::Entity as AdAccount;
pub use campaign::Entity as Campaign;
pub use client::Entity as Client;
pub use daily_metric::Entity as DailyMetric;
pub use public_report::Entity as PublicReport;
pub use sync_config::Entity as SyncConfig;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "traffic-manager".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
