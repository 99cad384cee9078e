//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod token;
mod transaction;
mod user;
pub mod result;

pub use account::Account;
pub use token::Claims;
pub use transaction::{Transaction, TransactionType};
pub use user::{NewUser, Role, User};
