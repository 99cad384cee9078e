//! Migrate command - apply pending schema migrations

use anyhow::{Context, Result};
use bankhub_core::adapters::duckdb::{DuckDbRepository, DB_FILENAME};
use bankhub_core::services::LogEvent;
use colored::Colorize;

use super::{get_data_dir, get_logger, log_event};

pub fn run(dry_run: bool, json: bool) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    // Open the repository directly: the context would migrate on open
    let repository = DuckDbRepository::new(&data_dir.join(DB_FILENAME))?;
    if dry_run {
        return print_pending(&repository, json);
    }

    let logger = get_logger();

    let result = match repository.run_migrations() {
        Ok(result) => result,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("migration_failed")
                    .with_command("migrate")
                    .with_error(e.to_string()),
            );
            return Err(e);
        }
    };
    log_event(&logger, LogEvent::new("command_executed").with_command("migrate"));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.applied.is_empty() {
        println!(
            "Schema is up to date ({} migrations applied)",
            result.already_applied
        );
        return Ok(());
    }

    println!("{}", "Applied migrations".green());
    for name in &result.applied {
        println!("  {}", name);
    }
    Ok(())
}

fn print_pending(repository: &DuckDbRepository, json: bool) -> Result<()> {
    let pending = repository.pending_migrations()?;

    if json {
        println!("{}", serde_json::json!({ "pending": pending }));
        return Ok(());
    }

    if pending.is_empty() {
        println!("Schema is up to date");
        return Ok(());
    }

    println!("{}", "Pending migrations".yellow());
    for name in &pending {
        println!("  {}", name);
    }
    Ok(())
}
