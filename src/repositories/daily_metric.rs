//! Daily metric repository
//!
//! One batched insert-or-overwrite per campaign keyed by (campanha_id, data).

use chrono::{NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::daily_metric::{self, Entity as DailyMetric};
use crate::normalization::NormalizedDailyMetric;

const UPSERT_CHUNK: usize = 200;

#[derive(Debug, Clone)]
pub struct DailyMetricRepository {
    pub db: Arc<DatabaseConnection>,
}

impl DailyMetricRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Upsert daily rows of a campaign. Returns the number of records written.
    pub async fn upsert_for_campaign(
        &self,
        campanha_id: Uuid,
        metrics: &[NormalizedDailyMetric],
    ) -> Result<usize, RepositoryError> {
        let now = Utc::now().fixed_offset();

        for chunk in metrics.chunks(UPSERT_CHUNK) {
            let rows = chunk.iter().map(|m| daily_metric::ActiveModel {
                id: Set(Uuid::new_v4()),
                campanha_id: Set(campanha_id),
                data: Set(m.data),
                gasto_dia: Set(m.gasto_dia),
                impressoes_dia: Set(m.impressoes_dia),
                cliques_dia: Set(m.cliques_dia),
                leads_dia: Set(m.leads_dia),
                ctr_dia: Set(m.ctr_dia),
                cpc_dia: Set(m.cpc_dia),
                cpm_dia: Set(m.cpm_dia),
                updated_at: Set(now),
            });

            DailyMetric::insert_many(rows)
                .on_conflict(
                    OnConflict::columns([
                        daily_metric::Column::CampanhaId,
                        daily_metric::Column::Data,
                    ])
                    .update_columns([
                        daily_metric::Column::GastoDia,
                        daily_metric::Column::ImpressoesDia,
                        daily_metric::Column::CliquesDia,
                        daily_metric::Column::LeadsDia,
                        daily_metric::Column::CtrDia,
                        daily_metric::Column::CpcDia,
                        daily_metric::Column::CpmDia,
                        daily_metric::Column::UpdatedAt,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(&*self.db)
                .await?;
        }

        Ok(metrics.len())
    }

    /// When the campaign's metrics were last written, if ever
    pub async fn last_written_at(
        &self,
        campanha_id: Uuid,
    ) -> Result<Option<DateTimeWithTimeZone>, RepositoryError> {
        Ok(DailyMetric::find()
            .filter(daily_metric::Column::CampanhaId.eq(campanha_id))
            .order_by_desc(daily_metric::Column::UpdatedAt)
            .one(&*self.db)
            .await?
            .map(|m| m.updated_at))
    }

    pub async fn list_for_campaign(
        &self,
        campanha_id: Uuid,
    ) -> Result<Vec<daily_metric::Model>, RepositoryError> {
        Ok(DailyMetric::find()
            .filter(daily_metric::Column::CampanhaId.eq(campanha_id))
            .order_by_asc(daily_metric::Column::Data)
            .all(&*self.db)
            .await?)
    }

    /// Rows of the given campaigns dated `since` or later, oldest first
    pub async fn list_for_campaigns_since(
        &self,
        campanha_ids: &[Uuid],
        since: NaiveDate,
    ) -> Result<Vec<daily_metric::Model>, RepositoryError> {
        if campanha_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(DailyMetric::find()
            .filter(daily_metric::Column::CampanhaId.is_in(campanha_ids.iter().copied()))
            .filter(daily_metric::Column::Data.gte(since))
            .order_by_asc(daily_metric::Column::Data)
            .order_by_asc(daily_metric::Column::CampanhaId)
            .all(&*self.db)
            .await?)
    }
}
