//! # Report Management Handlers
//!
//! Session-scoped CRUD over a manager's public reports. Ownership is
//! checked before any mutation: a report owned by someone else answers 403
//! and is left untouched.

use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ManagerSession;
use crate::error::{ApiError, forbidden, not_found};
use crate::models::public_report;
use crate::repositories::{
    ClientRepository, NewPublicReport, PublicReportChanges, PublicReportRepository,
};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReportRequest {
    pub cliente_id: Uuid,
    pub titulo: String,
    #[serde(default)]
    pub descricao: Option<String>,
    /// RFC 3339; omit for a report that never expires
    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub data_expiracao: Option<DateTimeWithTimeZone>,
}

/// Partial update. An explicit `null` clears `descricao` or `data_expiracao`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>)]
    pub descricao: Option<Option<String>>,
    #[serde(default)]
    pub ativo: Option<bool>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub data_expiracao: Option<Option<DateTimeWithTimeZone>>,
}

fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<UpdateReportRequest> for PublicReportChanges {
    fn from(request: UpdateReportRequest) -> Self {
        Self {
            titulo: request.titulo,
            descricao: request.descricao,
            ativo: request.ativo,
            data_expiracao: request.data_expiracao,
        }
    }
}

/// Loads the report and checks the caller owns it.
async fn owned_report(
    reports: &PublicReportRepository,
    session: ManagerSession,
    id: Uuid,
) -> Result<public_report::Model, ApiError> {
    let report = reports
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found("Report not found"))?;

    if report.gestor_id != session.gestor_id {
        tracing::warn!(
            report_id = %id,
            gestor_id = %session.gestor_id,
            "Report ownership check failed"
        );
        return Err(forbidden(Some("Report belongs to another manager")));
    }

    Ok(report)
}

/// Lists the caller's reports, newest first
#[utoipa::path(
    get,
    path = "/api/reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reports owned by the caller", body = [public_report::Model]),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<AppState>,
    session: ManagerSession,
) -> Result<Json<Vec<public_report::Model>>, ApiError> {
    let reports = PublicReportRepository::new(state.db.clone())
        .list_for_manager(session.gestor_id)
        .await?;
    Ok(Json(reports))
}

/// Creates a report for one of the caller's clients
#[utoipa::path(
    post,
    path = "/api/reports",
    security(("bearer_auth" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report created", body = public_report::Model),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "reports"
)]
pub async fn create_report(
    State(state): State<AppState>,
    session: ManagerSession,
    payload: Result<Json<CreateReportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<public_report::Model>), ApiError> {
    let Json(request) = payload?;

    ClientRepository::new(state.db.clone())
        .find_owned(session.gestor_id, request.cliente_id)
        .await?
        .ok_or_else(|| not_found("Client not found"))?;

    let report = PublicReportRepository::new(state.db.clone())
        .create(
            session.gestor_id,
            NewPublicReport {
                cliente_id: request.cliente_id,
                titulo: request.titulo,
                descricao: request.descricao,
                data_expiracao: request.data_expiracao,
            },
        )
        .await?;

    tracing::info!(
        report_id = %report.id,
        cliente_id = %report.cliente_id,
        "Public report created"
    );
    Ok((StatusCode::CREATED, Json(report)))
}

/// Updates one of the caller's reports
#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Report updated", body = public_report::Model),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 403, description = "Report belongs to another manager", body = ApiError),
        (status = 404, description = "Report not found", body = ApiError)
    ),
    tag = "reports"
)]
pub async fn update_report(
    State(state): State<AppState>,
    session: ManagerSession,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateReportRequest>, JsonRejection>,
) -> Result<Json<public_report::Model>, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let reports = PublicReportRepository::new(state.db.clone());
    let report = owned_report(&reports, session, id).await?;
    let updated = reports.update(report, request.into()).await?;

    Ok(Json(updated))
}

/// Deletes one of the caller's reports
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 403, description = "Report belongs to another manager", body = ApiError),
        (status = 404, description = "Report not found", body = ApiError)
    ),
    tag = "reports"
)]
pub async fn delete_report(
    State(state): State<AppState>,
    session: ManagerSession,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    let reports = PublicReportRepository::new(state.db.clone());
    let report = owned_report(&reports, session, id).await?;
    reports.delete(report.id).await?;

    tracing::info!(report_id = %id, "Public report deleted");
    Ok(StatusCode::NO_CONTENT)
}
