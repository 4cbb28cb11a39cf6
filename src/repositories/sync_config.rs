//! Sync configuration repository
//!
//! Per-manager automatic sync settings and the orchestrator's bookkeeping.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::sync_config::{self, Entity as SyncConfig};

/// Partial update of a manager's sync settings
#[derive(Debug, Clone, Default)]
pub struct SyncSettingsUpdate {
    pub sync_automatico: Option<bool>,
    pub intervalo_horas: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct SyncConfigRepository {
    pub db: Arc<DatabaseConnection>,
}

impl SyncConfigRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_for_manager(
        &self,
        gestor_id: Uuid,
    ) -> Result<Option<sync_config::Model>, RepositoryError> {
        Ok(SyncConfig::find()
            .filter(sync_config::Column::GestorId.eq(gestor_id))
            .one(&*self.db)
            .await?)
    }

    /// Apply `update`, creating the settings row on first use with
    /// `default_interval_hours`.
    pub async fn save_for_manager(
        &self,
        gestor_id: Uuid,
        update: SyncSettingsUpdate,
        default_interval_hours: i32,
    ) -> Result<sync_config::Model, RepositoryError> {
        if let Some(hours) = update.intervalo_horas
            && !(1..=168).contains(&hours)
        {
            return Err(RepositoryError::validation(
                "intervalo_horas must be between 1 and 168",
            ));
        }

        let now = Utc::now().fixed_offset();

        match self.find_for_manager(gestor_id).await? {
            Some(existing) => {
                let mut active = existing.into_active_model();
                if let Some(enabled) = update.sync_automatico {
                    active.sync_automatico = Set(enabled);
                }
                if let Some(hours) = update.intervalo_horas {
                    active.intervalo_horas = Set(hours);
                }
                active.updated_at = Set(now);
                Ok(active.update(&*self.db).await?)
            }
            None => {
                let active = sync_config::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    gestor_id: Set(gestor_id),
                    sync_automatico: Set(update.sync_automatico.unwrap_or(false)),
                    intervalo_horas: Set(update.intervalo_horas.unwrap_or(default_interval_hours)),
                    proxima_execucao: Set(None),
                    ultima_execucao: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                Ok(active.insert(&*self.db).await?)
            }
        }
    }

    /// Managers with automatic sync switched on
    pub async fn list_enabled(&self) -> Result<Vec<sync_config::Model>, RepositoryError> {
        Ok(SyncConfig::find()
            .filter(sync_config::Column::SyncAutomatico.eq(true))
            .order_by_asc(sync_config::Column::CreatedAt)
            .order_by_asc(sync_config::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Stamp a finished run and schedule the next one
    pub async fn record_run(
        &self,
        config: sync_config::Model,
        ran_at: DateTimeWithTimeZone,
    ) -> Result<sync_config::Model, RepositoryError> {
        let next = config.next_run_after(ran_at);
        let mut active = config.into_active_model();
        active.ultima_execucao = Set(Some(ran_at));
        active.proxima_execucao = Set(Some(next));
        active.updated_at = Set(ran_at);
        Ok(active.update(&*self.db).await?)
    }
}
