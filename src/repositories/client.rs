//! # Client Repository
//!
//! Manager-scoped access to agency clients.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::client::{self, Entity as Client};

/// Values for a new client
#[derive(Debug, Clone)]
pub struct NewClient {
    pub nome: String,
    pub email: Option<String>,
    pub empresa: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ClientRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        gestor_id: Uuid,
        new_client: NewClient,
    ) -> Result<client::Model, RepositoryError> {
        let nome = new_client.nome.trim().to_string();
        if nome.is_empty() {
            return Err(RepositoryError::validation("nome must not be empty"));
        }

        let now = Utc::now().fixed_offset();
        let active = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            gestor_id: Set(gestor_id),
            nome: Set(nome),
            email: Set(new_client.email.filter(|e| !e.trim().is_empty())),
            empresa: Set(new_client.empresa.filter(|e| !e.trim().is_empty())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(active.insert(&*self.db).await?)
    }

    /// Clients of a manager ordered by name
    pub async fn list_for_manager(
        &self,
        gestor_id: Uuid,
    ) -> Result<Vec<client::Model>, RepositoryError> {
        Ok(Client::find()
            .filter(client::Column::GestorId.eq(gestor_id))
            .order_by_asc(client::Column::Nome)
            .order_by_asc(client::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<client::Model>, RepositoryError> {
        Ok(Client::find_by_id(id).one(&*self.db).await?)
    }

    /// Client only if it belongs to `gestor_id`
    pub async fn find_owned(
        &self,
        gestor_id: Uuid,
        id: Uuid,
    ) -> Result<Option<client::Model>, RepositoryError> {
        Ok(Client::find_by_id(id)
            .filter(client::Column::GestorId.eq(gestor_id))
            .one(&*self.db)
            .await?)
    }
}
