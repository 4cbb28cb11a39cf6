//! Sync configuration entity model
//!
//! Per-manager automatic sync settings (`config_sync`). The orchestrator
//! advances `proxima_execucao` after each run.

use chrono::Duration;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "config_sync")]
#[schema(as = ConfigSync)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// One settings row per manager
    pub gestor_id: Uuid,

    pub sync_automatico: bool,

    /// Hours between automatic runs
    pub intervalo_horas: i32,

    /// Absent means due now
    #[schema(value_type = Option<String>, format = DateTime)]
    pub proxima_execucao: Option<DateTimeWithTimeZone>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub ultima_execucao: Option<DateTimeWithTimeZone>,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether an automatic run is due at `now`.
    pub fn is_due(&self, now: DateTimeWithTimeZone) -> bool {
        match self.proxima_execucao {
            Some(next) => now >= next,
            None => true,
        }
    }

    /// Next run time counted from `now`.
    pub fn next_run_after(&self, now: DateTimeWithTimeZone) -> DateTimeWithTimeZone {
        now + Duration::hours(i64::from(self.intervalo_horas.max(1)))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
