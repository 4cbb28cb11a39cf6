//! Public report entity model
//!
//! A shareable, token-addressed read-only view of a client's campaigns
//! (`relatorios_publicos`).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "relatorios_publicos")]
#[schema(as = RelatorioPublico)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Opaque server-generated share token (unique)
    pub token: String,

    /// Manager that owns the report
    pub gestor_id: Uuid,

    pub cliente_id: Uuid,

    pub titulo: String,

    pub descricao: Option<String>,

    /// Inactive reports are not found publicly, whatever their expiry
    pub ativo: bool,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub data_expiracao: Option<DateTimeWithTimeZone>,

    /// Successful public reads
    pub visualizacoes: i64,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub ultima_visualizacao: Option<DateTimeWithTimeZone>,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_expired(&self, now: DateTimeWithTimeZone) -> bool {
        self.data_expiracao.is_some_and(|expiry| expiry < now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClienteId",
        to = "super::client::Column::Id"
    )]
    Client,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
