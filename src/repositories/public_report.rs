//! Public report repository
//!
//! Token-addressed share links. Ownership checks happen in the caller before
//! any mutation reaches this layer; the view counter is bumped with a single
//! atomic UPDATE.

use chrono::Utc;
use rand::RngCore;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::public_report::{self, Entity as PublicReport};

const TOKEN_BYTES: usize = 32;

/// 32 random bytes, base64url encoded
pub fn generate_report_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64_url::encode(&bytes)
}

#[derive(Debug, Clone)]
pub struct NewPublicReport {
    pub cliente_id: Uuid,
    pub titulo: String,
    pub descricao: Option<String>,
    pub data_expiracao: Option<DateTimeWithTimeZone>,
}

/// Fields a manager may change. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct PublicReportChanges {
    pub titulo: Option<String>,
    pub descricao: Option<Option<String>>,
    pub ativo: Option<bool>,
    pub data_expiracao: Option<Option<DateTimeWithTimeZone>>,
}

#[derive(Debug, Clone)]
pub struct PublicReportRepository {
    pub db: Arc<DatabaseConnection>,
}

fn validate_title(titulo: &str) -> Result<String, RepositoryError> {
    let trimmed = titulo.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation("titulo must not be empty"));
    }
    if trimmed.chars().count() > 200 {
        return Err(RepositoryError::validation("titulo must be at most 200 characters"));
    }
    Ok(trimmed.to_string())
}

impl PublicReportRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        gestor_id: Uuid,
        report: NewPublicReport,
    ) -> Result<public_report::Model, RepositoryError> {
        let titulo = validate_title(&report.titulo)?;
        let now = Utc::now().fixed_offset();

        let active = public_report::ActiveModel {
            id: Set(Uuid::new_v4()),
            token: Set(generate_report_token()),
            gestor_id: Set(gestor_id),
            cliente_id: Set(report.cliente_id),
            titulo: Set(titulo),
            descricao: Set(report.descricao),
            ativo: Set(true),
            data_expiracao: Set(report.data_expiracao),
            visualizacoes: Set(0),
            ultima_visualizacao: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(active.insert(&*self.db).await?)
    }

    /// Reports of a manager, newest first
    pub async fn list_for_manager(
        &self,
        gestor_id: Uuid,
    ) -> Result<Vec<public_report::Model>, RepositoryError> {
        Ok(PublicReport::find()
            .filter(public_report::Column::GestorId.eq(gestor_id))
            .order_by_desc(public_report::Column::CreatedAt)
            .order_by_desc(public_report::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<public_report::Model>, RepositoryError> {
        Ok(PublicReport::find_by_id(id).one(&*self.db).await?)
    }

    pub async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<public_report::Model>, RepositoryError> {
        Ok(PublicReport::find()
            .filter(public_report::Column::Token.eq(token))
            .one(&*self.db)
            .await?)
    }

    pub async fn update(
        &self,
        report: public_report::Model,
        changes: PublicReportChanges,
    ) -> Result<public_report::Model, RepositoryError> {
        let mut active = report.into_active_model();

        if let Some(titulo) = changes.titulo {
            active.titulo = Set(validate_title(&titulo)?);
        }
        if let Some(descricao) = changes.descricao {
            active.descricao = Set(descricao);
        }
        if let Some(ativo) = changes.ativo {
            active.ativo = Set(ativo);
        }
        if let Some(expiry) = changes.data_expiracao {
            active.data_expiracao = Set(expiry);
        }
        active.updated_at = Set(Utc::now().fixed_offset());

        Ok(active.update(&*self.db).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = PublicReport::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("Report not found"));
        }
        Ok(())
    }

    /// `visualizacoes = visualizacoes + 1` and stamp the view time
    pub async fn record_view(
        &self,
        id: Uuid,
        viewed_at: DateTimeWithTimeZone,
    ) -> Result<(), RepositoryError> {
        let result = PublicReport::update_many()
            .col_expr(
                public_report::Column::Visualizacoes,
                Expr::col(public_report::Column::Visualizacoes).add(1),
            )
            .col_expr(public_report::Column::UltimaVisualizacao, Expr::value(viewed_at))
            .filter(public_report::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("Report not found"));
        }
        Ok(())
    }
}
