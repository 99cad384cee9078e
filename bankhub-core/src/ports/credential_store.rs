//! Credential store port - persistence of user records

use crate::domain::result::Result;
use crate::domain::{NewUser, User};

/// User record persistence
///
/// Implementations must enforce username and email uniqueness on `save`
/// themselves and report a duplicate as `Error::Conflict`. The registration
/// flow checks first, but two concurrent registrations can both pass that
/// check; the store is the last line.
pub trait CredentialStore: Send + Sync {
    /// Look up a user by exact username
    fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Look up a user by exact email
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist a new user, returning it with its assigned id
    fn save(&self, user: NewUser) -> Result<User>;
}
