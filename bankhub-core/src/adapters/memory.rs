//! In-memory credential store
//!
//! Used by unit tests and by embedders that do not want a database file.
//! Applies the same uniqueness rules as the DuckDB store.

use std::sync::Mutex;

use chrono::Utc;

use crate::domain::result::{Error, Result, EMAIL_IN_USE, USERNAME_IN_USE};
use crate::domain::{NewUser, User};
use crate::ports::CredentialStore;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find(&self, matches: impl Fn(&User) -> bool) -> Result<Option<User>> {
        let users = self
            .users
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?;
        Ok(users.iter().find(|u| matches(u)).cloned())
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find(|u| u.username == username)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find(|u| u.email == email)
    }

    fn save(&self, user: NewUser) -> Result<User> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?;

        if users.iter().any(|u| u.email == user.email) {
            return Err(Error::conflict(EMAIL_IN_USE));
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(Error::conflict(USERNAME_IN_USE));
        }

        let id = users.len() as i64 + 1;
        let user = user.into_user(id, Utc::now().naive_utc());
        users.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password: "hash".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            role: Role::Customer,
        }
    }

    #[test]
    fn test_save_assigns_sequential_ids() {
        let store = InMemoryCredentialStore::new();
        assert!(store.is_empty());

        let a = store.save(new_user("alice", "a@x.com")).unwrap();
        let b = store.save(new_user("bob", "b@x.com")).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_uniqueness_enforced_on_save() {
        let store = InMemoryCredentialStore::new();
        store.save(new_user("alice", "a@x.com")).unwrap();

        let err = store.save(new_user("alice", "b@x.com")).unwrap_err();
        assert_eq!(err.to_string(), USERNAME_IN_USE);
        let err = store.save(new_user("bob", "a@x.com")).unwrap_err();
        assert_eq!(err.to_string(), EMAIL_IN_USE);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookups() {
        let store = InMemoryCredentialStore::new();
        store.save(new_user("alice", "a@x.com")).unwrap();

        assert!(store.find_by_username("alice").unwrap().is_some());
        assert!(store.find_by_email("a@x.com").unwrap().is_some());
        assert!(store.find_by_username("bob").unwrap().is_none());
    }
}
