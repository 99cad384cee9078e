//! Setup command - write server settings to settings.json

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bankhub_core::config::{Config, MIN_SECRET_LEN};
use bankhub_core::services::LogEvent;
use colored::Colorize;
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::{get_data_dir, get_logger, log_event};

/// Length of generated signing secrets
const GENERATED_SECRET_LEN: usize = 48;

pub struct SetupArgs {
    pub listen: Option<String>,
    pub token_ttl_secs: Option<u64>,
    pub rotate_secret: bool,
    pub json: bool,
}

struct SetupOutcome {
    settings_path: PathBuf,
    secret_generated: bool,
}

pub fn run(args: SetupArgs) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    let outcome = configure(&data_dir, &args)?;
    log_event(&get_logger(), LogEvent::new("command_executed").with_command("setup"));

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "settingsPath": outcome.settings_path,
                "secretGenerated": outcome.secret_generated,
            })
        );
        return Ok(());
    }

    println!("{} Settings written to {}", "Success!".green(), outcome.settings_path.display());
    if outcome.secret_generated {
        println!("A new signing secret was generated. Tokens issued before it are no longer valid.");
    }
    Ok(())
}

/// Apply the arguments to the settings file in `data_dir`
///
/// Environment overrides are not read, so they never end up on disk.
fn configure(data_dir: &Path, args: &SetupArgs) -> Result<SetupOutcome> {
    let mut config = Config::load_file(data_dir)?;

    if let Some(listen) = &args.listen {
        config.listen = listen.clone();
    }
    if let Some(ttl) = args.token_ttl_secs {
        config.token_ttl_secs = ttl;
    }

    let secret_generated = args.rotate_secret
        || config
            .jwt_secret
            .as_ref()
            .map_or(true, |secret| secret.len() < MIN_SECRET_LEN);
    if secret_generated {
        config.jwt_secret = Some(generate_secret());
    }

    config
        .token_config()
        .context("Refusing to write settings")?;
    config.save(data_dir)?;

    Ok(SetupOutcome {
        settings_path: data_dir.join("settings.json"),
        secret_generated,
    })
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}
