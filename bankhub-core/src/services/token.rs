//! Bearer token issuing and verification
//!
//! Tokens are HS256-signed JWTs carrying the username as `sub` and the
//! user's role. The signing secret comes from configuration.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::TokenConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{Claims, User};

/// Issues and verifies signed tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_secs: config.ttl_secs,
        }
    }

    /// Issue a token for an authenticated user, valid from now
    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, now_secs()?)
    }

    fn issue_at(&self, user: &User, issued_at: u64) -> Result<String> {
        let expires_at = issued_at
            .checked_add(self.ttl_secs)
            .ok_or_else(|| Error::Token("Token lifetime overflows the clock".into()))?;
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            iat: issued_at,
            exp: expires_at,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Token(format!("Failed to sign token: {e}")))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => Error::Unauthorized("Token expired".into()),
                _ => Error::Unauthorized("Invalid token".into()),
            })
    }
}

fn now_secs() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| Error::Token(format!("System time error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    const SECRET: &str = "test-secret-that-is-long-enough-0123";

    fn issuer(secret: &str, ttl_secs: u64) -> TokenIssuer {
        TokenIssuer::new(&TokenConfig {
            secret: secret.into(),
            ttl_secs,
        })
    }

    fn user() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            role: Role::Admin,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer(SECRET, 36_000);
        let token = issuer.issue(&user()).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 36_000);
    }

    #[test]
    fn test_token_does_not_carry_password_hash() {
        let issuer = issuer(SECRET, 60);
        let token = issuer.issue(&user()).unwrap();
        let claims = issuer.verify(&token).unwrap();
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer(SECRET, 60);
        let issued_at = now_secs().unwrap() - 3_600;
        let token = issuer.issue_at(&user(), issued_at).unwrap();

        match issuer.verify(&token) {
            Err(Error::Unauthorized(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("expected expiry failure, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer(SECRET, 60).issue(&user()).unwrap();
        let other = issuer("another-secret-that-is-long-enough-99", 60);

        assert!(matches!(other.verify(&token), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_overflowing_ttl_is_an_error() {
        let issuer = issuer(SECRET, u64::MAX);
        assert!(matches!(issuer.issue(&user()), Err(Error::Token(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = issuer(SECRET, 60);
        assert!(matches!(
            issuer.verify("not.a.token"),
            Err(Error::Unauthorized(_))
        ));
    }
}
