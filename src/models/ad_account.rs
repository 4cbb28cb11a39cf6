//! Ad account entity model
//!
//! A Meta ad account (`contas_anuncio`) connected by a manager. The external
//! id is stored without the `act_` prefix and the access token only ever as
//! AES-256-GCM ciphertext.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "contas_anuncio")]
#[schema(as = ContaAnuncio)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Manager that connected the account
    pub gestor_id: Uuid,

    /// Client the account advertises for (optional)
    pub cliente_id: Option<Uuid>,

    /// Numeric Meta ad account id (unique per manager)
    pub id_conta_externa: String,

    pub nome: Option<String>,

    /// Encrypted access token; never serialized
    #[serde(skip)]
    #[schema(ignore)]
    pub token_acesso_cifrado: Option<Vec<u8>>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub token_expira_em: Option<DateTimeWithTimeZone>,

    /// Inactive accounts are skipped by automatic sync
    pub ativo: bool,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClienteId",
        to = "super::client::Column::Id"
    )]
    Client,
    #[sea_orm(has_many = "super::campaign::Entity")]
    Campaign,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
