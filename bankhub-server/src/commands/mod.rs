//! CLI command implementations

pub mod logs;
pub mod migrate;
pub mod register;
pub mod serve;
pub mod setup;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bankhub_core::services::{EntryPoint, LogEvent, LoggingService};
use bankhub_core::BankhubContext;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        l.record(event);
    }
}

/// Data directory from `BANKHUB_DIR`, else `~/.bankhub`
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BANKHUB_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".bankhub"))
        .context("Could not find home directory; set BANKHUB_DIR")
}

/// Open the BankHub context for the data directory
pub fn get_context() -> Result<BankhubContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    BankhubContext::new(&data_dir).context("Failed to initialize BankHub context")
}
