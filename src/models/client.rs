//! Client entity model
//!
//! An agency client (`clientes`) owned by a manager. Public reports and ad
//! accounts point at a client.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "clientes")]
#[schema(as = Cliente)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning manager
    pub gestor_id: Uuid,

    pub nome: String,

    pub email: Option<String>,

    pub empresa: Option<String>,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ad_account::Entity")]
    AdAccount,
    #[sea_orm(has_many = "super::public_report::Entity")]
    PublicReport,
}

impl Related<super::ad_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdAccount.def()
    }
}

impl Related<super::public_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PublicReport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
