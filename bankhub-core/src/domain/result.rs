//! Result and error types for the core library

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Field name -> reason, ordered so responses are stable
pub type FieldErrors = BTreeMap<String, String>;

/// Message returned for every failed login, whatever the cause
pub const BAD_CREDENTIALS: &str = "Incorrect username or password";

pub const EMAIL_IN_USE: &str = "Email is already in use";
pub const USERNAME_IN_USE: &str = "Username is already in use";

/// Coarse classification used by front-ends to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Conflict,
    Unauthorized,
    Validation,
    Internal,
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Validation failed: {}", format_fields(.0))]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

fn format_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, reason)| format!("{field} {reason}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// The generic login failure
    pub fn bad_credentials() -> Self {
        Self::Unauthorized(BAD_CREDENTIALS.to_string())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a validation error for a single field
    pub fn validation_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), reason.into());
        Self::Validation(fields)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Database(_)
            | Error::Config(_)
            | Error::Token(_)
            | Error::Hashing(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Other(_) => ErrorKind::Internal,
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
