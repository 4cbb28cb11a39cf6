//! Campaign entity model
//!
//! One row per external campaign id within an ad account (`campanhas`).
//! Aggregate fields are overwritten on every sync.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "campanhas")]
#[schema(as = Campanha)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning ad account; (id_externo, conta_id) is unique
    pub conta_id: Uuid,

    /// Meta campaign id
    pub id_externo: String,

    pub nome: String,

    /// Provider status, e.g. ACTIVE or PAUSED
    pub status: String,

    pub objetivo: Option<String>,

    /// Spend over the trailing 30 days
    pub gasto_total: f64,

    pub alcance: i64,

    pub impressoes: i64,

    pub cliques: i64,

    pub ctr: f64,

    #[schema(value_type = String, format = DateTime)]
    pub ultima_atualizacao: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ad_account::Entity",
        from = "Column::ContaId",
        to = "super::ad_account::Column::Id"
    )]
    AdAccount,
    #[sea_orm(has_many = "super::daily_metric::Entity")]
    DailyMetric,
}

impl Related<super::ad_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdAccount.def()
    }
}

impl Related<super::daily_metric::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyMetric.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
