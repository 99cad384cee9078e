//! Route handlers
//!
//! Password hashing and database access block, so the auth calls run on
//! tokio's blocking pool.

use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use bankhub_core::domain::result::Result as CoreResult;
use bankhub_core::services::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use bankhub_core::{Error, Role};

use super::error::ApiError;
use super::{AppState, BLOCKING_BUDGET_SECS, LOGIN_ROUTE, ME_ROUTE, REGISTER_ROUTE};

/// Run a blocking core call off the async runtime
///
/// `TimeoutLayer` answers 408 by dropping this future, but a blocking task
/// that has started keeps running and may still commit. Work that has not
/// started within `BLOCKING_BUDGET_SECS` of the handler being entered is
/// skipped, so it cannot land after the client was told the request timed
/// out.
async fn run_blocking<T, F>(f: F) -> CoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> CoreResult<T> + Send + 'static,
{
    run_blocking_until(Instant::now() + Duration::from_secs(BLOCKING_BUDGET_SECS), f).await
}

async fn run_blocking_until<T, F>(deadline: Instant, f: F) -> CoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> CoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        if Instant::now() >= deadline {
            return Err(Error::Other("Request budget exhausted before work started".into()));
        }
        f()
    })
    .await
    .map_err(|e| Error::Other(format!("Blocking task failed: {}", e)))?
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(request) = payload?;

    let response = run_blocking(move || {
        let result = state.auth.register(request);
        state.audit(REGISTER_ROUTE, "user_registered", &result);
        result
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    let response = run_blocking(move || {
        let result = state.auth.login(request);
        state.audit(LOGIN_ROUTE, "login_succeeded", &result);
        result
    })
    .await?;

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub username: String,
    pub role: Role,
    /// Unix seconds
    pub issued_at: u64,
    /// Unix seconds
    pub expires_at: u64,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| Error::Unauthorized("Missing bearer token".into()))?;

    let result = state.auth.verify_token(token);
    if let Err(e) = &result {
        state.audit_failure(ME_ROUTE, e);
    }
    let claims = result?;

    Ok(Json(MeResponse {
        username: claims.sub,
        role: claims.role,
        issued_at: claims.iat,
        expires_at: claims.exp,
    }))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
