//! Ad account repository
//!
//! Connected Meta ad accounts. Access tokens are encrypted on the way in and
//! only decrypted when a sync needs them.

use chrono::Utc;
use regex::Regex;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::crypto::{CryptoKey, decrypt_account_token, encrypt_account_token, is_encrypted_payload};
use crate::error::RepositoryError;
use crate::models::ad_account::{self, Entity as AdAccount};

static ACCOUNT_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Strip the optional `act_` prefix and require a numeric id.
pub fn normalize_external_account_id(raw: &str) -> Result<String, RepositoryError> {
    let pattern = ACCOUNT_ID_PATTERN
        .get_or_init(|| Regex::new(r"^(?:act_)?(\d{1,32})$").expect("account id pattern is valid"));

    pattern
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            RepositoryError::validation(format!("invalid ad account id '{}'", raw.trim()))
        })
}

/// Values for connecting (or reconnecting) an ad account
#[derive(Debug, Clone)]
pub struct ConnectAccount {
    pub gestor_id: Uuid,
    pub id_conta_externa: String,
    pub nome: Option<String>,
    pub cliente_id: Option<Uuid>,
    pub access_token: String,
    pub token_expira_em: Option<DateTimeWithTimeZone>,
}

#[derive(Debug, Clone)]
pub struct AdAccountRepository {
    pub db: Arc<DatabaseConnection>,
    pub crypto_key: CryptoKey,
}

impl AdAccountRepository {
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self { db, crypto_key }
    }

    /// Insert the account or, when the manager already connected it, replace
    /// its token and details and reactivate it.
    pub async fn connect(
        &self,
        request: ConnectAccount,
    ) -> Result<ad_account::Model, RepositoryError> {
        let external_id = normalize_external_account_id(&request.id_conta_externa)?;
        if request.access_token.trim().is_empty() {
            return Err(RepositoryError::validation("access_token must not be empty"));
        }

        let ciphertext = encrypt_account_token(
            &self.crypto_key,
            request.gestor_id,
            &external_id,
            request.access_token.trim(),
        )?;

        let now = Utc::now().fixed_offset();
        let active = ad_account::ActiveModel {
            id: Set(Uuid::new_v4()),
            gestor_id: Set(request.gestor_id),
            cliente_id: Set(request.cliente_id),
            id_conta_externa: Set(external_id.clone()),
            nome: Set(request.nome),
            token_acesso_cifrado: Set(Some(ciphertext)),
            token_expira_em: Set(request.token_expira_em),
            ativo: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        AdAccount::insert(active)
            .on_conflict(
                OnConflict::columns([
                    ad_account::Column::GestorId,
                    ad_account::Column::IdContaExterna,
                ])
                .update_columns([
                    ad_account::Column::ClienteId,
                    ad_account::Column::Nome,
                    ad_account::Column::TokenAcessoCifrado,
                    ad_account::Column::TokenExpiraEm,
                    ad_account::Column::Ativo,
                    ad_account::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        AdAccount::find()
            .filter(ad_account::Column::GestorId.eq(request.gestor_id))
            .filter(ad_account::Column::IdContaExterna.eq(external_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("ad account not persisted"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ad_account::Model>, RepositoryError> {
        Ok(AdAccount::find_by_id(id).one(&*self.db).await?)
    }

    /// Account only if it belongs to `gestor_id`
    pub async fn find_owned(
        &self,
        gestor_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ad_account::Model>, RepositoryError> {
        Ok(AdAccount::find_by_id(id)
            .filter(ad_account::Column::GestorId.eq(gestor_id))
            .one(&*self.db)
            .await?)
    }

    pub async fn list_for_manager(
        &self,
        gestor_id: Uuid,
    ) -> Result<Vec<ad_account::Model>, RepositoryError> {
        Ok(AdAccount::find()
            .filter(ad_account::Column::GestorId.eq(gestor_id))
            .order_by_asc(ad_account::Column::CreatedAt)
            .order_by_asc(ad_account::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Active accounts of a manager, in a stable order for sequential sync
    pub async fn list_active_for_manager(
        &self,
        gestor_id: Uuid,
    ) -> Result<Vec<ad_account::Model>, RepositoryError> {
        Ok(AdAccount::find()
            .filter(ad_account::Column::GestorId.eq(gestor_id))
            .filter(ad_account::Column::Ativo.eq(true))
            .order_by_asc(ad_account::Column::CreatedAt)
            .order_by_asc(ad_account::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Decrypted access token, `None` when the account has no token stored
    pub fn access_token(
        &self,
        account: &ad_account::Model,
    ) -> Result<Option<String>, RepositoryError> {
        let Some(ciphertext) = account.token_acesso_cifrado.as_deref() else {
            return Ok(None);
        };

        if !is_encrypted_payload(ciphertext) {
            tracing::warn!(
                account_id = %account.id,
                "Plaintext access token found on ad account, reconnect the account to encrypt it"
            );
        }

        let token = decrypt_account_token(
            &self.crypto_key,
            account.gestor_id,
            &account.id_conta_externa,
            ciphertext,
        )
        .inspect_err(|_| {
            tracing::error!(account_id = %account.id, "Access token decryption failed")
        })?;

        Ok(Some(token).filter(|t| !t.is_empty()))
    }

    /// Seal every token still stored as plaintext. Returns how many accounts
    /// were rewritten.
    pub async fn reencrypt_plaintext_tokens(&self) -> Result<usize, RepositoryError> {
        let accounts = AdAccount::find()
            .filter(ad_account::Column::TokenAcessoCifrado.is_not_null())
            .all(&*self.db)
            .await?;

        let mut rewritten = 0usize;
        for account in accounts {
            let Some(stored) = account.token_acesso_cifrado.as_deref() else {
                continue;
            };
            if stored.is_empty() || is_encrypted_payload(stored) {
                continue;
            }

            let plaintext = String::from_utf8_lossy(stored).into_owned();
            let ciphertext = encrypt_account_token(
                &self.crypto_key,
                account.gestor_id,
                &account.id_conta_externa,
                &plaintext,
            )?;

            let account_id = account.id;
            let mut active = account.into_active_model();
            active.token_acesso_cifrado = Set(Some(ciphertext));
            active.updated_at = Set(Utc::now().fixed_offset());
            active.update(&*self.db).await?;

            tracing::info!(account_id = %account_id, "Plaintext access token encrypted");
            rewritten += 1;
        }

        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_ids_are_stored_without_prefix() {
        assert_eq!(normalize_external_account_id("act_123456").unwrap(), "123456");
        assert_eq!(normalize_external_account_id(" 987 ").unwrap(), "987");
    }

    #[test]
    fn non_numeric_external_ids_are_rejected() {
        assert!(matches!(
            normalize_external_account_id("act_abc"),
            Err(RepositoryError::Validation(_))
        ));
        assert!(normalize_external_account_id("").is_err());
        assert!(normalize_external_account_id("act_").is_err());
    }
}
