//! Serve command - run the HTTP API

use std::sync::Arc;

use anyhow::{Context, Result};
use bankhub_core::config::TokenConfig;
use bankhub_core::services::{EntryPoint, LogEvent, LoggingService};
use bankhub_core::BankhubContext;
use tokio::net::TcpListener;

use super::get_context;
use crate::http::{self, AppState};

pub fn run(listen: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    let (token_config, listen) = server_settings(&ctx, listen)?;

    let events = match LoggingService::new(&ctx.data_dir, EntryPoint::Server, env!("CARGO_PKG_VERSION")) {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            tracing::warn!(error = %e, "event log unavailable");
            None
        }
    };
    if let Some(events) = &events {
        events.record(LogEvent::new("server_started"));
    }

    let state = AppState::new(Arc::clone(&ctx.auth_service), events);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let listener = TcpListener::bind(&listen)
            .await
            .with_context(|| format!("Failed to bind {}", listen))?;
        tracing::info!(
            address = %listener.local_addr()?,
            token_ttl_secs = token_config.ttl_secs,
            "BankHub listening"
        );
        http::serve(listener, state).await
    })
}

/// Signing settings and listen address; fails without a usable secret
fn server_settings(ctx: &BankhubContext, listen: Option<String>) -> Result<(TokenConfig, String)> {
    let token_config = ctx
        .config
        .token_config()
        .context("Cannot start the server")?;
    let listen = listen.unwrap_or_else(|| ctx.config.listen.clone());
    Ok((token_config, listen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankhub_core::config::{Argon2Params, Config, DEFAULT_LISTEN};
    use tempfile::TempDir;

    fn context(secret: Option<&str>) -> (TempDir, BankhubContext) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.jwt_secret = secret.map(str::to_string);
        config.argon2 = Argon2Params {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            hash_len: 32,
        };
        let ctx = BankhubContext::with_config(dir.path(), config).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_refuses_to_start_without_secret() {
        let (_dir, ctx) = context(None);
        let err = server_settings(&ctx, None).unwrap_err();
        assert!(format!("{:#}", err).contains("Cannot start the server"));
    }

    #[test]
    fn test_refuses_to_start_with_short_secret() {
        let (_dir, ctx) = context(Some("0123456789abcdef0123456789abcde"));
        assert!(server_settings(&ctx, None).is_err());
    }

    #[test]
    fn test_listen_flag_overrides_settings() {
        let (_dir, ctx) = context(Some("0123456789abcdef0123456789abcdef"));

        let (_, listen) = server_settings(&ctx, None).unwrap();
        assert_eq!(listen, DEFAULT_LISTEN);

        let (token, listen) = server_settings(&ctx, Some("0.0.0.0:9000".into())).unwrap();
        assert_eq!(listen, "0.0.0.0:9000");
        assert_eq!(token.ttl_secs, ctx.config.token_ttl_secs);
    }
}
