//! Authentication service - registration, login and token checks

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, FieldErrors, Result, EMAIL_IN_USE, USERNAME_IN_USE};
use crate::domain::{Claims, NewUser, Role, User};
use crate::ports::CredentialStore;
use crate::services::password::PasswordHasher;
use crate::services::token::TokenIssuer;

pub const USER_CREATED: &str = "User created successfully";

const BLANK: &str = "must not be blank";

/// Registration payload
///
/// Missing fields deserialize as empty strings so they surface as
/// per-field validation errors.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("role", &self.role)
            .finish()
    }
}

impl RegisterRequest {
    /// Check every field, returning the parsed role
    ///
    /// All failing fields are reported together.
    pub fn validate(&self) -> Result<Role> {
        let mut errors = FieldErrors::new();

        for (field, value) in [
            ("username", &self.username),
            ("password", &self.password),
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
        ] {
            if value.trim().is_empty() {
                errors.insert(field.into(), BLANK.into());
            }
        }

        if self.email.trim().is_empty() {
            errors.insert("email".into(), BLANK.into());
        } else if !is_well_formed_email(&self.email) {
            errors.insert("email".into(), "must be a well-formed email address".into());
        }

        let role = if self.role.trim().is_empty() {
            errors.insert("role".into(), BLANK.into());
            None
        } else {
            match self.role.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    errors.insert("role".into(), "must be one of CUSTOMER, ADMIN".into());
                    None
                }
            }
        };

        match role {
            Some(role) if errors.is_empty() => Ok(role),
            _ => Err(Error::Validation(errors)),
        }
    }
}

/// `local@domain`: one `@`, both sides non-empty, no whitespace, and the
/// domain neither starts nor ends with a dot
fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
}

/// Login payload
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.insert("username".into(), BLANK.into());
        }
        if self.password.is_empty() {
            errors.insert("password".into(), BLANK.into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Registration and login over a credential store
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: Option<TokenIssuer>,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            hasher,
            issuer: None,
        }
    }

    /// Enable login and token verification
    pub fn with_token_issuer(mut self, issuer: TokenIssuer) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn can_issue_tokens(&self) -> bool {
        self.issuer.is_some()
    }

    fn issuer(&self) -> Result<&TokenIssuer> {
        self.issuer
            .as_ref()
            .ok_or_else(|| Error::Config("token signing is not configured".into()))
    }

    /// Create a new user account
    ///
    /// Email is checked before username, so a request clashing on both
    /// reports the email. The store's own uniqueness check covers
    /// registrations racing past these lookups.
    pub fn register(&self, request: RegisterRequest) -> Result<RegisterResponse> {
        let role = request.validate()?;

        if self.store.find_by_email(&request.email)?.is_some() {
            return Err(Error::conflict(EMAIL_IN_USE));
        }
        if self.store.find_by_username(&request.username)?.is_some() {
            return Err(Error::conflict(USERNAME_IN_USE));
        }

        let password = self.hasher.hash(&request.password)?;
        let user = self.store.save(NewUser {
            username: request.username,
            email: request.email,
            password,
            first_name: request.first_name,
            last_name: request.last_name,
            role,
        })?;

        tracing::info!(user_id = user.id, role = %user.role, "user registered");
        Ok(RegisterResponse {
            message: USER_CREATED.to_string(),
        })
    }

    /// Check a username/password pair
    ///
    /// Unknown user and wrong password fail identically, and the unknown
    /// user path still pays for one hash verification.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        match self.store.find_by_username(username)? {
            Some(user) if self.hasher.verify(password, &user.password) => Ok(user),
            Some(_) => Err(Error::bad_credentials()),
            None => {
                self.hasher.verify_dummy(password);
                Err(Error::bad_credentials())
            }
        }
    }

    /// Authenticate and issue a bearer token
    pub fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        request.validate()?;
        let issuer = self.issuer()?;
        let user = self.authenticate(&request.username, &request.password)?;
        let token = issuer.issue(&user)?;

        tracing::debug!(user_id = user.id, "token issued");
        Ok(LoginResponse { token })
    }

    /// Verify a bearer token and return its claims
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.issuer()?.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCredentialStore;
    use crate::config::TokenConfig;
    use crate::domain::result::{ErrorKind, BAD_CREDENTIALS};
    use crate::services::password::test_params;

    fn service() -> (AuthService, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let hasher = PasswordHasher::new(&test_params()).unwrap();
        let issuer = TokenIssuer::new(&TokenConfig {
            secret: "test-secret-that-is-long-enough-0123".into(),
            ttl_secs: 36_000,
        });
        let service = AuthService::new(store.clone(), hasher).with_token_issuer(issuer);
        (service, store)
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "p1".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            role: "CUSTOMER".into(),
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_register_then_login() {
        let (service, _) = service();

        let response = service.register(register_request("alice", "a@x.com")).unwrap();
        assert_eq!(response.message, USER_CREATED);

        let login = service.login(login_request("alice", "p1")).unwrap();
        let claims = service.verify_token(&login.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Customer);
    }

    #[test]
    fn test_stored_password_is_hashed() {
        let (service, store) = service();
        service.register(register_request("alice", "a@x.com")).unwrap();

        let user = store.find_by_username("alice").unwrap().unwrap();
        assert_ne!(user.password, "p1");
        assert!(user.password.starts_with("$argon2id$"));
    }

    #[test]
    fn test_duplicate_username() {
        let (service, _) = service();
        service.register(register_request("alice", "a@x.com")).unwrap();

        let err = service
            .register(register_request("alice", "b@x.com"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), USERNAME_IN_USE);
    }

    #[test]
    fn test_duplicate_email_reported_first() {
        let (service, _) = service();
        service.register(register_request("alice", "a@x.com")).unwrap();

        let err = service
            .register(register_request("alice", "a@x.com"))
            .unwrap_err();
        assert_eq!(err.to_string(), EMAIL_IN_USE);

        let err = service
            .register(register_request("bob", "a@x.com"))
            .unwrap_err();
        assert_eq!(err.to_string(), EMAIL_IN_USE);
    }

    #[test]
    fn test_failed_registration_changes_nothing() {
        let (service, store) = service();
        let mut request = register_request("alice", "a@x.com");
        request.role = "TELLER".into();

        assert!(matches!(service.register(request), Err(Error::Validation(_))));
        assert!(store.find_by_username("alice").unwrap().is_none());
    }

    #[test]
    fn test_validation_collects_all_fields() {
        let request = RegisterRequest {
            email: "not-an-email".into(),
            role: "customer".into(),
            ..Default::default()
        };

        match request.validate() {
            Err(Error::Validation(fields)) => {
                assert_eq!(fields.len(), 5);
                assert!(fields.contains_key("username"));
                assert!(fields.contains_key("password"));
                assert!(fields.contains_key("firstName"));
                assert!(fields.contains_key("lastName"));
                assert_eq!(fields["email"], "must be a well-formed email address");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_role_case_insensitive() {
        let mut request = register_request("alice", "a@x.com");
        request.role = "admin".into();
        assert_eq!(request.validate().unwrap(), Role::Admin);
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_well_formed_email("a@x.com"));
        assert!(is_well_formed_email("first.last@localhost"));
        assert!(!is_well_formed_email("a@"));
        assert!(!is_well_formed_email("@x.com"));
        assert!(!is_well_formed_email("a@@x.com"));
        assert!(!is_well_formed_email("a b@x.com"));
        assert!(!is_well_formed_email("a@x.com."));
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let (service, _) = service();
        service.register(register_request("alice", "a@x.com")).unwrap();

        let wrong_password = service.login(login_request("alice", "nope")).unwrap_err();
        let unknown_user = service.login(login_request("ghost", "p1")).unwrap_err();

        assert_eq!(wrong_password.kind(), ErrorKind::Unauthorized);
        assert_eq!(unknown_user.kind(), ErrorKind::Unauthorized);
        assert_eq!(wrong_password.to_string(), BAD_CREDENTIALS);
        assert_eq!(unknown_user.to_string(), BAD_CREDENTIALS);
    }

    #[test]
    fn test_login_is_case_sensitive() {
        let (service, _) = service();
        service.register(register_request("alice", "a@x.com")).unwrap();

        assert!(service.login(login_request("Alice", "p1")).is_err());
        assert!(service.login(login_request("alice", "P1")).is_err());
    }

    #[test]
    fn test_blank_login_is_validation_error() {
        let (service, _) = service();
        let err = service.login(login_request("", "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_login_without_issuer_is_internal() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let hasher = PasswordHasher::new(&test_params()).unwrap();
        let service = AuthService::new(store, hasher);

        service.register(register_request("alice", "a@x.com")).unwrap();
        let err = service.login(login_request("alice", "p1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!service.can_issue_tokens());
    }

    #[test]
    fn test_debug_hides_password() {
        let request = register_request("alice", "a@x.com");
        assert!(!format!("{request:?}").contains("p1"));
        assert!(!format!("{:?}", login_request("alice", "p1")).contains("p1"));
    }
}
