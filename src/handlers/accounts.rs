//! # Ad Account Handlers
//!
//! Connect and list the caller's Meta ad accounts. Access tokens are
//! encrypted before they reach the database and never leave it again
//! through the API.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ManagerSession;
use crate::error::{ApiError, not_found, provider_error};
use crate::models::ad_account;
use crate::repositories::{AdAccountRepository, ClientRepository, ConnectAccount};
use crate::server::AppState;

/// Ad account as exposed by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountInfo {
    pub id: Uuid,
    /// Numeric Meta account id, without the `act_` prefix
    pub id_conta_externa: String,
    pub nome: Option<String>,
    pub cliente_id: Option<Uuid>,
    pub ativo: bool,
    pub token_expira_em: Option<DateTime<FixedOffset>>,
    /// Indicates whether an encrypted access token is stored
    #[schema(default = false, example = true)]
    pub has_access_token: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl From<ad_account::Model> for AccountInfo {
    fn from(model: ad_account::Model) -> Self {
        Self {
            id: model.id,
            id_conta_externa: model.id_conta_externa,
            nome: model.nome,
            cliente_id: model.cliente_id,
            ativo: model.ativo,
            token_expira_em: model.token_expira_em,
            has_access_token: model.token_acesso_cifrado.is_some(),
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectAccountRequest {
    /// Meta account id, with or without the `act_` prefix
    #[schema(example = "act_1234567890")]
    pub id_conta_externa: String,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub cliente_id: Option<Uuid>,
    pub access_token: String,
    /// Exchange a short-lived user token for a long-lived one before storing it
    #[serde(default)]
    pub exchange_long_lived: bool,
}

/// Lists the caller's connected ad accounts
#[utoipa::path(
    get,
    path = "/api/meta/accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Connected ad accounts", body = [AccountInfo]),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "accounts"
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    session: ManagerSession,
) -> Result<Json<Vec<AccountInfo>>, ApiError> {
    let accounts = AdAccountRepository::new(state.db.clone(), state.crypto_key.clone())
        .list_for_manager(session.gestor_id)
        .await?;

    Ok(Json(accounts.into_iter().map(AccountInfo::from).collect()))
}

/// Absolute expiry for a provider `expires_in`; out-of-range lifetimes are
/// treated as no expiry.
fn token_expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> Option<DateTime<FixedOffset>> {
    let lifetime = Duration::try_seconds(expires_in?)?;
    now.checked_add_signed(lifetime).map(|at| at.fixed_offset())
}

/// Connects (or reconnects) a Meta ad account for the caller
#[utoipa::path(
    post,
    path = "/api/meta/accounts",
    security(("bearer_auth" = [])),
    request_body = ConnectAccountRequest,
    responses(
        (status = 201, description = "Account connected", body = AccountInfo),
        (status = 400, description = "Validation or provider error", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "accounts"
)]
pub async fn connect_account(
    State(state): State<AppState>,
    session: ManagerSession,
    payload: Result<Json<ConnectAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountInfo>), ApiError> {
    let Json(request) = payload?;

    if let Some(cliente_id) = request.cliente_id {
        ClientRepository::new(state.db.clone())
            .find_owned(session.gestor_id, cliente_id)
            .await?
            .ok_or_else(|| not_found("Client not found"))?;
    }

    let (access_token, token_expira_em) = if request.exchange_long_lived {
        let exchanged = state
            .connector
            .exchange_long_lived_token(&request.access_token)
            .await
            .map_err(|err| provider_error(err.to_string(), err.provider_code()))?;
        let expires_at = token_expiry(Utc::now(), exchanged.expires_in);
        (exchanged.access_token, expires_at)
    } else {
        (request.access_token, None)
    };

    let account = AdAccountRepository::new(state.db.clone(), state.crypto_key.clone())
        .connect(ConnectAccount {
            gestor_id: session.gestor_id,
            id_conta_externa: request.id_conta_externa,
            nome: request.nome,
            cliente_id: request.cliente_id,
            access_token,
            token_expira_em,
        })
        .await?;

    tracing::info!(
        account_id = %account.id,
        long_lived = request.exchange_long_lived,
        "Ad account connected"
    );
    Ok((StatusCode::CREATED, Json(account.into())))
}
