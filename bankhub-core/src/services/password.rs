//! Password hashing and verification using Argon2id
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...`), so the salt and cost
//! parameters travel with the hash and old hashes keep verifying after the
//! configured parameters change.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;

use crate::config::Argon2Params;
use crate::domain::result::{Error, Result};

/// Hashed once at construction, verified against when a login names an
/// unknown user so that path costs the same as a wrong password.
const DUMMY_PASSWORD: &str = "bankhub-unknown-user";

const SALT_LEN: usize = 16;

/// One-way password hasher configured at startup
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(params: &Argon2Params) -> Result<Self> {
        let params = Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(params.hash_len as usize),
        )
        .map_err(|e| Error::Config(format!("Invalid Argon2 parameters: {e}")))?;

        let mut hasher = Self {
            params,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt_bytes: [u8; SALT_LEN] = rand::thread_rng().gen();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| Error::Hashing(format!("Failed to encode salt: {e}")))?;
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Hashing(format!("Failed to hash password: {e}")))
    }

    /// Check a submitted password against a stored hash
    ///
    /// A stored value that is not a PHC string never matches.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => {
                tracing::warn!("stored password hash is not a valid PHC string");
                false
            }
        }
    }

    /// Spend one verification on a throwaway hash
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

#[cfg(test)]
pub(crate) fn test_params() -> Argon2Params {
    Argon2Params {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
        hash_len: 32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(&test_params()).unwrap();
        let hash = hasher.hash("correct-horse-battery-staple").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct-horse-battery-staple"));
        assert!(hasher.verify("correct-horse-battery-staple", &hash));
        assert!(!hasher.verify("wrong-password", &hash));
    }

    #[test]
    fn test_different_salts() {
        let hasher = PasswordHasher::new(&test_params()).unwrap();
        let hash1 = hasher.hash("same-password").unwrap();
        let hash2 = hasher.hash("same-password").unwrap();

        assert_ne!(hash1, hash2);
        let parsed = PasswordHash::new(&hash1).unwrap();
        // 16 random bytes, unpadded base64
        assert_eq!(parsed.salt.unwrap().as_str().len(), 22);
        assert!(hasher.verify("same-password", &hash1));
        assert!(hasher.verify("same-password", &hash2));
    }

    #[test]
    fn test_hash_from_other_params_still_verifies() {
        let old = PasswordHasher::new(&Argon2Params {
            memory_cost: 2048,
            time_cost: 2,
            ..test_params()
        })
        .unwrap();
        let hash = old.hash("p1").unwrap();

        let current = PasswordHasher::new(&test_params()).unwrap();
        assert!(current.verify("p1", &hash));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let hasher = PasswordHasher::new(&test_params()).unwrap();
        assert!(!hasher.verify("p1", "p1"));
        assert!(!hasher.verify("p1", ""));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordHasher::new(&Argon2Params {
            memory_cost: 1,
            ..test_params()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
