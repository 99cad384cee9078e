//! Status service - user, account and transaction summaries

use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::Role;

/// Status service for store summaries
pub struct StatusService {
    repository: Arc<DuckDbRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let users_by_role = self
            .repository
            .count_users_by_role()?
            .into_iter()
            .map(|c| RoleSummary {
                role: c.role,
                count: c.count,
            })
            .collect();

        Ok(StatusSummary {
            total_users: self.repository.get_user_count()?,
            users_by_role,
            total_accounts: self.repository.get_account_count()?,
            total_transactions: self.repository.get_transaction_count()?,
            total_balance: self.repository.get_total_balance()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_users: i64,
    pub users_by_role: Vec<RoleSummary>,
    pub total_accounts: i64,
    pub total_transactions: i64,
    /// Serialized as a string so no precision is lost
    pub total_balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct RoleSummary {
    pub role: Role,
    pub count: i64,
}
