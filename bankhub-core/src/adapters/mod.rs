//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the CredentialStore port and entity persistence
//! - An in-memory CredentialStore for tests and embedding

pub mod duckdb;
pub mod memory;
