//! BankHub - banking auth backend and admin CLI

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod http;
mod output;

use commands::{logs, migrate, register, serve, setup, status};

/// BankHub - user registration, login and token issuance
#[derive(Parser)]
#[command(name = "bankhub", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides settings.json)
        #[arg(long, env = "BANKHUB_LISTEN")]
        listen: Option<String>,
    },

    /// Write server settings, generating a signing secret if none is set
    Setup {
        /// Address to listen on
        #[arg(long)]
        listen: Option<String>,
        /// Token lifetime in seconds
        #[arg(long)]
        token_ttl_secs: Option<u64>,
        /// Replace the existing signing secret
        #[arg(long)]
        rotate_secret: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply pending database migrations
    Migrate {
        /// List pending migrations without applying them
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show user, account and transaction summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a user
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// CUSTOMER or ADMIN
        #[arg(long, default_value = "CUSTOMER")]
        role: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn init_tracing() {
    // Diagnostics go to stderr so --json output stays clean
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bankhub=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { listen } => serve::run(listen),
        Commands::Setup {
            listen,
            token_ttl_secs,
            rotate_secret,
            json,
        } => setup::run(setup::SetupArgs {
            listen,
            token_ttl_secs,
            rotate_secret,
            json,
        }),
        Commands::Migrate { dry_run, json } => migrate::run(dry_run, json),
        Commands::Status { json } => status::run(json),
        Commands::Register {
            username,
            email,
            first_name,
            last_name,
            role,
            password,
            json,
        } => register::run(register::RegisterArgs {
            username,
            email,
            first_name,
            last_name,
            role,
            password,
            json,
        }),
        Commands::Logs { command } => logs::run(command),
    }
}
