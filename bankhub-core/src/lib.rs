//! BankHub Core - user registration, login and token issuance
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Account, Transaction, Claims)
//! - **ports**: Trait definitions for external dependencies (CredentialStore)
//! - **services**: Business logic orchestration (auth, tokens, status, event log)
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::{DuckDbRepository, DB_FILENAME};
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, ErrorKind, FieldErrors};
pub use domain::{Account, Claims, NewUser, Role, Transaction, TransactionType, User};

/// Main context for BankHub operations
///
/// Holds the configuration, the database and the services built on it.
/// Token signing is enabled only when the configuration carries a usable
/// secret; registration and status work without one.
pub struct BankhubContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub repository: Arc<DuckDbRepository>,
    pub auth_service: Arc<AuthService>,
    pub status_service: StatusService,
}

impl BankhubContext {
    /// Load configuration from the data directory and open the database
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        Self::with_config(data_dir, config)
    }

    /// Open the database with an already resolved configuration
    pub fn with_config(data_dir: &Path, config: Config) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&data_dir.join(DB_FILENAME))?);
        repository.ensure_schema()?;

        let hasher = PasswordHasher::new(&config.argon2)?;
        let mut auth_service = AuthService::new(repository.clone(), hasher);
        match config.token_config() {
            Ok(token_config) => {
                auth_service = auth_service.with_token_issuer(TokenIssuer::new(&token_config));
            }
            Err(e) => tracing::debug!(reason = %e, "token signing disabled"),
        }

        let status_service = StatusService::new(Arc::clone(&repository));

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            repository,
            auth_service: Arc::new(auth_service),
            status_service,
        })
    }
}
