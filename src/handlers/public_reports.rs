//! # Public Report Handler
//!
//! Unauthenticated, token-addressed report view shared with a manager's
//! client. Inactive reports are indistinguishable from missing ones; a
//! report past its expiry answers 410.

use axum::{
    extract::{Path, State, rejection::PathRejection},
    response::Json,
};
use metrics::counter;
use serde::Serialize;
use utoipa::ToSchema;

use crate::connectors::InsightWindow;
use crate::error::{ApiError, expired, not_found};
use crate::models::{campaign, client, daily_metric, public_report};
use crate::repositories::{
    CampaignRepository, ClientRepository, DailyMetricRepository, PublicReportRepository,
};
use crate::server::AppState;

/// Aggregated totals over the report's metric rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ReportSummary {
    pub gasto_total: f64,
    pub impressoes: i64,
    pub cliques: i64,
    pub leads: i64,
    /// Clicks over impressions, in percent
    pub ctr: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicReportView {
    pub relatorio: public_report::Model,
    pub cliente: client::Model,
    pub campanhas: Vec<campaign::Model>,
    pub metricas: Vec<daily_metric::Model>,
    pub resumo: ReportSummary,
    /// Leads are estimated from clicks, not measured conversions
    pub leads_estimados: bool,
}

pub fn summarize(metricas: &[daily_metric::Model]) -> ReportSummary {
    let mut summary = metricas.iter().fold(ReportSummary::default(), |mut acc, m| {
        acc.gasto_total += m.gasto_dia;
        acc.impressoes += m.impressoes_dia;
        acc.cliques += m.cliques_dia;
        acc.leads += m.leads_dia;
        acc
    });

    if summary.impressoes > 0 {
        summary.ctr = summary.cliques as f64 / summary.impressoes as f64 * 100.0;
    }
    summary
}

/// Fetches a shared report by its public token and counts the view
#[utoipa::path(
    get,
    path = "/api/public/reports/{token}",
    params(("token" = String, Path, description = "Public report token")),
    responses(
        (status = 200, description = "Report with client, campaigns and trailing 30-day metrics", body = PublicReportView),
        (status = 404, description = "Report missing or inactive", body = ApiError),
        (status = 410, description = "Report expired", body = ApiError)
    ),
    tag = "public"
)]
pub async fn get_public_report(
    State(state): State<AppState>,
    token: Result<Path<String>, PathRejection>,
) -> Result<Json<PublicReportView>, ApiError> {
    let Path(token) = token?;
    let reports = PublicReportRepository::new(state.db.clone());

    let mut relatorio = reports
        .find_by_token(&token)
        .await?
        .filter(|report| report.ativo)
        .ok_or_else(|| not_found("Report not found"))?;

    let now = chrono::Utc::now().fixed_offset();
    if relatorio.is_expired(now) {
        return Err(expired("Report has expired"));
    }

    reports.record_view(relatorio.id, now).await?;
    relatorio.visualizacoes += 1;
    relatorio.ultima_visualizacao = Some(now);
    counter!("public_report_views_total").increment(1);

    let cliente = ClientRepository::new(state.db.clone())
        .find_by_id(relatorio.cliente_id)
        .await?
        .ok_or_else(|| not_found("Client not found"))?;

    let campanhas = CampaignRepository::new(state.db.clone())
        .list_for_client(cliente.id)
        .await?;

    let campaign_ids: Vec<_> = campanhas.iter().map(|c| c.id).collect();
    let since = InsightWindow::ending(now.date_naive()).since;
    let metricas = DailyMetricRepository::new(state.db.clone())
        .list_for_campaigns_since(&campaign_ids, since)
        .await?;

    let resumo = summarize(&metricas);

    tracing::debug!(
        report_id = %relatorio.id,
        views = relatorio.visualizacoes,
        "Public report served"
    );

    Ok(Json(PublicReportView {
        relatorio,
        cliente,
        campanhas,
        metricas,
        resumo,
        leads_estimados: true,
    }))
}
