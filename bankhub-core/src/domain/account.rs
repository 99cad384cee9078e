//! Account domain model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bank account holding a fixed-point balance
///
/// Accounts are persisted as shapes only: nothing in the core mutates a
/// balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Store-assigned identity, `None` until saved
    pub id: Option<i64>,
    pub account_number: String,
    pub balance: Decimal,
}

impl Account {
    /// Create an unsaved account with a zero balance
    pub fn new(account_number: impl Into<String>) -> Self {
        Self {
            id: None,
            account_number: account_number.into(),
            balance: Decimal::ZERO,
        }
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.account_number.trim().is_empty() {
            return Err("account number cannot be empty");
        }
        // DECIMAL(19,2) in the store
        if self.balance.normalize().scale() > 2 {
            return Err("balance cannot have more than two decimal places");
        }
        Ok(())
    }
}
