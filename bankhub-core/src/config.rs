//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "server": { "listen": "127.0.0.1:8080" },
//!   "auth": {
//!     "jwtSecret": "...",
//!     "tokenTtlSecs": 36000,
//!     "argon2": { "memoryCost": 19456, "timeCost": 2, "parallelism": 1, "hashLen": 32 }
//!   }
//! }
//! ```
//! Environment variables override the file: `BANKHUB_JWT_SECRET`,
//! `BANKHUB_TOKEN_TTL_SECS`, `BANKHUB_LISTEN`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
/// 10 hours
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 10 * 60 * 60;
/// 30 days
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;
/// HS256 keys shorter than this are refused
pub const MIN_SECRET_LEN: usize = 32;

/// Default Argon2id parameters (OWASP minimum recommendation)
pub const DEFAULT_MEMORY_COST: u32 = 19_456; // 19 MiB
pub const DEFAULT_TIME_COST: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;
pub const DEFAULT_HASH_LEN: u32 = 32;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    server: ServerSettings,
    #[serde(default)]
    auth: AuthSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    listen: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jwt_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_ttl_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    argon2: Option<Argon2Params>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Argon2id cost parameters for password hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argon2Params {
    /// Memory in KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub hash_len: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_cost: DEFAULT_MEMORY_COST,
            time_cost: DEFAULT_TIME_COST,
            parallelism: DEFAULT_PARALLELISM,
            hash_len: DEFAULT_HASH_LEN,
        }
    }
}

/// Signing configuration handed to the token issuer
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl_secs: u64,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// BankHub configuration (resolved view of settings + environment)
#[derive(Clone)]
pub struct Config {
    pub listen: String,
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: u64,
    pub argon2: Argon2Params,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("argon2", &self.argon2)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default())
    }
}

impl Config {
    /// Load config from the data directory, then apply env overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(data_dir)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load only what `settings.json` says, ignoring the environment
    pub fn load_file(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        Ok(Self::from_settings(raw))
    }

    fn from_settings(raw: SettingsFile) -> Self {
        Self {
            listen: raw
                .server
                .listen
                .clone()
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            jwt_secret: raw.auth.jwt_secret.clone(),
            token_ttl_secs: raw.auth.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS),
            argon2: raw.auth.argon2.unwrap_or_default(),
            _raw_settings: raw,
        }
    }

    /// Apply `BANKHUB_*` overrides from the given lookup
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(secret) = lookup("BANKHUB_JWT_SECRET").filter(|s| !s.is_empty()) {
            self.jwt_secret = Some(secret);
        }
        if let Some(ttl) = lookup("BANKHUB_TOKEN_TTL_SECS") {
            self.token_ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("BANKHUB_TOKEN_TTL_SECS is not a number: {}", ttl))?;
        }
        if let Some(listen) = lookup("BANKHUB_LISTEN").filter(|s| !s.is_empty()) {
            self.listen = listen;
        }
        Ok(())
    }

    /// Signing configuration, or a config error when no usable secret is set
    pub fn token_config(&self) -> std::result::Result<TokenConfig, Error> {
        let secret = self.jwt_secret.clone().ok_or_else(|| {
            Error::Config("JWT secret is not set (auth.jwtSecret or BANKHUB_JWT_SECRET)".into())
        })?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "JWT secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(Error::Config(format!(
                "token ttl must be between 1 and {} seconds",
                MAX_TOKEN_TTL_SECS
            )));
        }
        Ok(TokenConfig {
            secret,
            ttl_secs: self.token_ttl_secs,
        })
    }

    /// Save config to the data directory
    /// Preserves other settings that BankHub doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            self._raw_settings.clone()
        };

        settings.server.listen = Some(self.listen.clone());
        settings.auth.jwt_secret = self.jwt_secret.clone();
        settings.auth.token_ttl_secs = Some(self.token_ttl_secs);
        settings.auth.argon2 = Some(self.argon2);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.argon2, Argon2Params::default());

        let config = Config::default();
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.token_ttl_secs, DEFAULT_TOKEN_TTL_SECS);
        assert!(config.token_config().is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config
            .apply_env_overrides(|key| match key {
                "BANKHUB_JWT_SECRET" => Some(SECRET.to_string()),
                "BANKHUB_TOKEN_TTL_SECS" => Some("60".to_string()),
                "BANKHUB_LISTEN" => Some("0.0.0.0:9000".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.listen, "0.0.0.0:9000");
        let token = config.token_config().unwrap();
        assert_eq!(token.secret, SECRET);
        assert_eq!(token.ttl_secs, 60);
    }

    #[test]
    fn test_bad_ttl_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|key| {
            (key == "BANKHUB_TOKEN_TTL_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_ttl_out_of_range_rejected() {
        let mut config = Config::default();
        config.jwt_secret = Some(SECRET.into());
        config
            .apply_env_overrides(|key| {
                (key == "BANKHUB_TOKEN_TTL_SECS").then(|| u64::MAX.to_string())
            })
            .unwrap();
        assert!(matches!(config.token_config(), Err(Error::Config(_))));

        config.token_ttl_secs = 0;
        assert!(config.token_config().is_err());

        config.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert_eq!(config.token_config().unwrap().ttl_secs, MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = Config::default();
        config.jwt_secret = Some("short".into());
        assert!(matches!(config.token_config(), Err(Error::Config(_))));
    }

    #[test]
    fn test_token_config_debug_hides_secret() {
        let token = TokenConfig {
            secret: SECRET.into(),
            ttl_secs: 10,
        };
        assert!(!format!("{:?}", token).contains(SECRET));

        let mut config = Config::default();
        config.jwt_secret = Some(SECRET.into());
        assert!(!format!("{:?}", config).contains(SECRET));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"listen": "127.0.0.1:1"}, "auth": {"tokenTtlSecs": 5}, "ui": {"theme": "dark"}}"#,
        )
        .unwrap();

        let mut config = Config::load_file(dir.path()).unwrap();
        assert_eq!(config.listen, "127.0.0.1:1");
        config.token_ttl_secs = 99;
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["ui"]["theme"], "dark");
        assert_eq!(saved["auth"]["tokenTtlSecs"], 99);
    }
}
