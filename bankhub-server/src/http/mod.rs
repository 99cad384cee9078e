//! HTTP API

pub mod error;
mod handlers;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use bankhub_core::domain::result::Result as CoreResult;
use bankhub_core::services::{AuthService, LogEvent, LoggingService};
use bankhub_core::{Error, ErrorKind};

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout, answered with 408
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Blocking work not started by then is skipped, leaving it time to finish
/// before the request timeout fires
pub const BLOCKING_BUDGET_SECS: u64 = REQUEST_TIMEOUT_SECS - 10;

pub const REGISTER_ROUTE: &str = "/api/v1/auth/register";
pub const LOGIN_ROUTE: &str = "/api/v1/auth/login";
pub const ME_ROUTE: &str = "/api/v1/auth/me";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    /// Event log; requests never fail because it is missing or broken
    pub events: Option<Arc<LoggingService>>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, events: Option<Arc<LoggingService>>) -> Self {
        Self { auth, events }
    }

    /// Record the outcome of a request in the event log
    fn audit<T>(&self, route: &str, success_event: &str, result: &CoreResult<T>) {
        match result {
            Ok(_) => self.record(LogEvent::new(success_event).with_route(route)),
            Err(e) => self.audit_failure(route, e),
        }
    }

    fn audit_failure(&self, route: &str, e: &Error) {
        let event = match e.kind() {
            ErrorKind::Internal => "internal_error",
            _ => "request_rejected",
        };
        self.record(
            LogEvent::new(event)
                .with_route(route)
                .with_error(error::category(e)),
        );
    }

    fn record(&self, event: LogEvent) {
        if let Some(events) = &self.events {
            events.record(event);
        }
    }
}

/// Build the application router with its middleware stack
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(REGISTER_ROUTE, post(handlers::register))
        .route(LOGIN_ROUTE, post(handlers::login))
        .route(ME_ROUTE, get(handlers::me))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl-C
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
