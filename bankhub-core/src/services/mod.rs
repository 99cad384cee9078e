//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod auth;
pub mod logging;
pub mod migration;
pub mod password;
mod status;
pub mod token;

pub use auth::{
    AuthService, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, USER_CREATED,
};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use password::PasswordHasher;
pub use status::{RoleSummary, StatusService, StatusSummary};
pub use token::TokenIssuer;
