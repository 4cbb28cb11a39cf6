//! Campaign repository
//!
//! Campaign rows are written with one batched insert-or-overwrite keyed by
//! (id_externo, conta_id).

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::ad_account;
use crate::models::campaign::{self, Entity as Campaign};
use crate::normalization::NormalizedCampaign;

/// Rows per INSERT statement, keeps SQLite under its bind parameter limit
const UPSERT_CHUNK: usize = 200;

#[derive(Debug, Clone)]
pub struct CampaignRepository {
    pub db: Arc<DatabaseConnection>,
}

impl CampaignRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Upsert campaigns of an account. Returns the number of records written.
    pub async fn upsert_for_account(
        &self,
        conta_id: Uuid,
        campaigns: &[NormalizedCampaign],
    ) -> Result<usize, RepositoryError> {
        let now = Utc::now().fixed_offset();

        for chunk in campaigns.chunks(UPSERT_CHUNK) {
            let rows = chunk.iter().map(|c| campaign::ActiveModel {
                id: Set(Uuid::new_v4()),
                conta_id: Set(conta_id),
                id_externo: Set(c.id_externo.clone()),
                nome: Set(c.nome.clone()),
                status: Set(c.status.clone()),
                objetivo: Set(c.objetivo.clone()),
                gasto_total: Set(c.gasto_total),
                alcance: Set(c.alcance),
                impressoes: Set(c.impressoes),
                cliques: Set(c.cliques),
                ctr: Set(c.ctr),
                ultima_atualizacao: Set(now),
            });

            Campaign::insert_many(rows)
                .on_conflict(
                    OnConflict::columns([campaign::Column::IdExterno, campaign::Column::ContaId])
                        .update_columns([
                            campaign::Column::Nome,
                            campaign::Column::Status,
                            campaign::Column::Objetivo,
                            campaign::Column::GastoTotal,
                            campaign::Column::Alcance,
                            campaign::Column::Impressoes,
                            campaign::Column::Cliques,
                            campaign::Column::Ctr,
                            campaign::Column::UltimaAtualizacao,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&*self.db)
                .await?;
        }

        Ok(campaigns.len())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<campaign::Model>, RepositoryError> {
        Ok(Campaign::find_by_id(id).one(&*self.db).await?)
    }

    pub async fn list_for_account(
        &self,
        conta_id: Uuid,
    ) -> Result<Vec<campaign::Model>, RepositoryError> {
        Ok(Campaign::find()
            .filter(campaign::Column::ContaId.eq(conta_id))
            .order_by_asc(campaign::Column::Nome)
            .order_by_asc(campaign::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Campaigns of every ad account linked to a client
    pub async fn list_for_client(
        &self,
        cliente_id: Uuid,
    ) -> Result<Vec<campaign::Model>, RepositoryError> {
        Ok(Campaign::find()
            .join(JoinType::InnerJoin, campaign::Relation::AdAccount.def())
            .filter(ad_account::Column::ClienteId.eq(cliente_id))
            .order_by_asc(campaign::Column::Nome)
            .order_by_asc(campaign::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
