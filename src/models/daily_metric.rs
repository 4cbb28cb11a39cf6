//! Daily metric entity model
//!
//! Per-day insight row for a campaign (`metricas_diarias`), unique on
//! (campanha_id, data).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::{Date, DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "metricas_diarias")]
#[schema(as = MetricaDiaria)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub campanha_id: Uuid,

    /// Calendar day the insight covers
    pub data: Date,

    pub gasto_dia: f64,

    pub impressoes_dia: i64,

    pub cliques_dia: i64,

    /// Estimated from clicks, not a measured conversion
    pub leads_dia: i64,

    pub ctr_dia: f64,

    pub cpc_dia: f64,

    pub cpm_dia: f64,

    /// Last time this row was written by a sync
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampanhaId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
