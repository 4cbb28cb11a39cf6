//! # Client Handlers

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::ManagerSession;
use crate::error::{ApiError, validation_error};
use crate::models::client;
use crate::repositories::{ClientRepository, NewClient};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateClientRequest {
    pub nome: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub empresa: Option<String>,
}

/// Lists the caller's clients
#[utoipa::path(
    get,
    path = "/api/clients",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Clients ordered by name", body = [client::Model]),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    session: ManagerSession,
) -> Result<Json<Vec<client::Model>>, ApiError> {
    let clients = ClientRepository::new(state.db.clone())
        .list_for_manager(session.gestor_id)
        .await?;
    Ok(Json(clients))
}

/// Creates a client owned by the caller
#[utoipa::path(
    post,
    path = "/api/clients",
    security(("bearer_auth" = [])),
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = client::Model),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    session: ManagerSession,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<client::Model>), ApiError> {
    let Json(request) = payload?;

    if let Some(email) = request.email.as_deref()
        && !email.trim().is_empty()
        && !email.contains('@')
    {
        return Err(validation_error(
            "Validation failed",
            serde_json::json!({ "email": "must be an email address" }),
        ));
    }

    let created = ClientRepository::new(state.db.clone())
        .create(
            session.gestor_id,
            NewClient {
                nome: request.nome,
                email: request.email,
                empresa: request.empresa,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
