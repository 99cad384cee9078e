//! User domain model

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Authorization tier assigned at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Customer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts the stored spelling in any case ("customer", "ADMIN", ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CUSTOMER" => Ok(Role::Customer),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A persisted user record
///
/// `password` always holds the Argon2 PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

/// A user that has not been saved yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl NewUser {
    /// Attach the store-assigned identity
    pub fn into_user(self, id: i64, created_at: NaiveDateTime) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("CUSTOMER".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("TELLER".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"CUSTOMER\"").unwrap();
        assert_eq!(role, Role::Customer);
    }

    #[test]
    fn test_into_user_keeps_fields() {
        let new_user = NewUser {
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "$argon2id$...".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            role: Role::Customer,
        };
        let created_at = chrono::Utc::now().naive_utc();
        let user = new_user.clone().into_user(7, created_at);
        assert_eq!(user.id, 7);
        assert_eq!(user.username, new_user.username);
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.created_at, created_at);
    }
}
