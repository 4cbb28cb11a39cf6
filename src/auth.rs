//! # Authentication and Authorization
//!
//! Manager sessions arrive as HS256 bearer JWTs issued by the hosted auth
//! service; this crate only verifies them. The automatic sync trigger can be
//! locked down with static cron tokens compared in constant time.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::server::AppState;

/// Claims carried by a manager session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Manager (gestor) id
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Authenticated manager making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerSession {
    pub gestor_id: Uuid,
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

/// Verify a session token and return the manager it belongs to.
pub fn verify_session_token(config: &AppConfig, token: &str) -> Result<ManagerSession, ApiError> {
    let Some(secret) = config.auth_jwt_secret.as_deref() else {
        tracing::warn!("Session verification requested but no JWT secret is configured");
        return Err(unauthorized(Some("Session verification is not configured")));
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.auth_jwt_audience.as_str()]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "Rejected session token");
        unauthorized(Some("Invalid or expired session"))
    })?;

    let gestor_id = data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| unauthorized(Some("Session subject is not a valid manager id")))?;

    Ok(ManagerSession { gestor_id })
}

impl<S> FromRequestParts<S> for ManagerSession
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<ManagerSession>() {
            return Ok(*session);
        }

        let config = Arc::<AppConfig>::from_ref(state);
        let token = extract_bearer_token(&parts.headers)?;
        let session = verify_session_token(&config, token)?;

        tracing::debug!(gestor_id = %session.gestor_id, "Authenticated manager request");
        parts.extensions.insert(session);
        Ok(session)
    }
}

/// Guards the automatic sync trigger when cron tokens are configured;
/// with no tokens configured the trigger stays open.
pub async fn cron_auth_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if config.cron_tokens.is_empty() {
        return Ok(next.run(request).await);
    }

    let token = extract_bearer_token(request.headers())?;
    let accepted = config
        .cron_tokens
        .iter()
        .any(|configured| bool::from(token.as_bytes().ct_eq(configured.as_bytes())));

    if !accepted {
        return Err(unauthorized(Some("Invalid cron token")));
    }

    Ok(next.run(request).await)
}
