//! Normalization of Graph API records into campaign and daily-metric rows.
//!
//! Numeric fields arrive as strings (`"12.5"`), occasionally as JSON numbers,
//! and are sometimes missing. Every numeric field follows [`metric_or_zero`]:
//! a missing or unparseable value becomes zero.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::connectors::{RawCampaign, RawInsight};

/// Default share of clicks reported as leads.
pub const DEFAULT_LEADS_CLICK_RATIO: f64 = 0.05;

/// Parse a numeric provider field, falling back to zero when it is missing,
/// empty, non-numeric or not finite.
pub fn metric_or_zero(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Integer counterpart of [`metric_or_zero`]; fractional counts are truncated.
pub fn count_or_zero(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    };
    parsed.filter(|v| *v >= 0).unwrap_or(0)
}

/// Synthetic lead estimate: `floor(clicks * ratio)`. Not a measured conversion.
pub fn estimate_leads(clicks: i64, ratio: f64) -> i64 {
    if clicks <= 0 || ratio <= 0.0 {
        return 0;
    }
    // Absorb binary rounding such as 0.29 * 100 = 28.999999999999996
    ((clicks as f64) * ratio + 1e-9).floor() as i64
}

/// Campaign row values derived from a [`RawCampaign`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedCampaign {
    pub id_externo: String,
    pub nome: String,
    pub status: String,
    pub objetivo: Option<String>,
    pub gasto_total: f64,
    pub alcance: i64,
    pub impressoes: i64,
    pub cliques: i64,
    pub ctr: f64,
}

/// Daily metric row values derived from a [`RawInsight`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDailyMetric {
    pub data: NaiveDate,
    pub gasto_dia: f64,
    pub impressoes_dia: i64,
    pub cliques_dia: i64,
    pub leads_dia: i64,
    pub ctr_dia: f64,
    pub cpc_dia: f64,
    pub cpm_dia: f64,
}

pub fn normalize_campaign(raw: &RawCampaign) -> NormalizedCampaign {
    let aggregate = raw
        .insights
        .as_ref()
        .and_then(|list| list.data.first());

    NormalizedCampaign {
        id_externo: raw.id.clone(),
        nome: raw
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Campanha {}", raw.id)),
        status: raw.status.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
        objetivo: raw.objective.clone(),
        gasto_total: metric_or_zero(aggregate.and_then(|a| a.spend.as_ref())),
        alcance: count_or_zero(aggregate.and_then(|a| a.reach.as_ref())),
        impressoes: count_or_zero(aggregate.and_then(|a| a.impressions.as_ref())),
        cliques: count_or_zero(aggregate.and_then(|a| a.clicks.as_ref())),
        ctr: metric_or_zero(aggregate.and_then(|a| a.ctr.as_ref())),
    }
}

/// Returns `None` when the record has no usable `date_start`; such rows
/// cannot be keyed and are dropped.
pub fn normalize_insight(
    raw: &RawInsight,
    leads_click_ratio: f64,
) -> Option<NormalizedDailyMetric> {
    let data = raw
        .date_start
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())?;

    let cliques_dia = count_or_zero(raw.clicks.as_ref());

    Some(NormalizedDailyMetric {
        data,
        gasto_dia: metric_or_zero(raw.spend.as_ref()),
        impressoes_dia: count_or_zero(raw.impressions.as_ref()),
        cliques_dia,
        leads_dia: estimate_leads(cliques_dia, leads_click_ratio),
        ctr_dia: metric_or_zero(raw.ctr.as_ref()),
        cpc_dia: metric_or_zero(raw.cpc.as_ref()),
        cpm_dia: metric_or_zero(raw.cpm.as_ref()),
    })
}
