//! Configuration resolution for Folio.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Config file (explicit path, else <config dir>/folio/auth.json)
//! 3. Environment variables (`FOLIO_*`)
//! 4. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Folio configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tokens: TokenConfig,
    pub mail: MailConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Upper bound for either token lifetime (one year).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Token signing configuration.
///
/// Secrets have no default; the server refuses to start without them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub access_secret: Option<String>,
    pub refresh_secret: Option<String>,
    /// Access token lifetime in seconds. Default: 15 minutes.
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds. Default: 7 days.
    pub refresh_ttl_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: None,
            refresh_secret: None,
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl TokenConfig {
    /// Return both signing secrets, failing if either is missing or empty.
    pub fn secrets(&self) -> Result<(&str, &str)> {
        let access = non_empty(self.access_secret.as_deref())
            .ok_or_else(|| Error::Config("access token secret is not set".into()))?;
        let refresh = non_empty(self.refresh_secret.as_deref())
            .ok_or_else(|| Error::Config("refresh token secret is not set".into()))?;
        let valid = 1..=MAX_TOKEN_TTL_SECS;
        if !valid.contains(&self.access_ttl_secs) || !valid.contains(&self.refresh_ttl_secs) {
            return Err(Error::Config(format!(
                "token TTLs must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"
            )));
        }
        Ok((access, refresh))
    }
}

/// Outbound mail configuration.
///
/// Without `api_url` the service logs mails instead of sending them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub sender: String,
    pub sender_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            sender: "no-reply@folio.local".to_string(),
            sender_name: "Folio".to_string(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Load configuration with hierarchical resolution.
///
/// An explicit `path` must exist; the global config file is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config directory path.
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("auth.json"))
}

/// Get the default database path.
pub fn database_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("auth.db"))
}

/// `folio/` under the platform config directory (`$XDG_CONFIG_HOME` on Linux).
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("folio"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `FOLIO_*` overrides, reading variables through `lookup`.
///
/// Unparseable numeric or address values are ignored.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("FOLIO_ADDR") {
        if let Ok(addr) = val.parse() {
            config.server.addr = addr;
        }
    }
    if let Some(val) = lookup("FOLIO_DATABASE_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = lookup("FOLIO_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Some(val) = lookup("FOLIO_ACCESS_TOKEN_SECRET") {
        config.tokens.access_secret = Some(val);
    }
    if let Some(val) = lookup("FOLIO_REFRESH_TOKEN_SECRET") {
        config.tokens.refresh_secret = Some(val);
    }
    if let Some(val) = lookup("FOLIO_ACCESS_TOKEN_TTL") {
        if let Ok(n) = val.parse() {
            config.tokens.access_ttl_secs = n;
        }
    }
    if let Some(val) = lookup("FOLIO_REFRESH_TOKEN_TTL") {
        if let Ok(n) = val.parse() {
            config.tokens.refresh_ttl_secs = n;
        }
    }
    if let Some(val) = lookup("FOLIO_MAIL_API_URL") {
        config.mail.api_url = Some(val);
    }
    if let Some(val) = lookup("FOLIO_MAIL_API_KEY") {
        config.mail.api_key = Some(val);
    }
    if let Some(val) = lookup("FOLIO_MAIL_SENDER") {
        config.mail.sender = val;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_token_ttls() {
        let config = Config::default();
        assert_eq!(config.tokens.access_ttl_secs, 900);
        assert_eq!(config.tokens.refresh_ttl_secs, 7 * 24 * 60 * 60);
    }

    #[test]
    fn missing_secrets_are_rejected() {
        let config = Config::default();
        assert!(config.tokens.secrets().is_err());

        let mut tokens = TokenConfig {
            access_secret: Some("a".into()),
            refresh_secret: Some("  ".into()),
            ..TokenConfig::default()
        };
        assert!(tokens.secrets().is_err());

        tokens.refresh_secret = Some("r".into());
        assert_eq!(tokens.secrets().unwrap(), ("a", "r"));
    }

    #[test]
    fn token_ttls_are_bounded() {
        let mut tokens = TokenConfig {
            access_secret: Some("a".into()),
            refresh_secret: Some("r".into()),
            ..TokenConfig::default()
        };
        tokens.refresh_ttl_secs = 0;
        assert!(tokens.secrets().is_err());
        tokens.refresh_ttl_secs = i64::MAX;
        assert!(tokens.secrets().is_err());
        tokens.refresh_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        assert!(tokens.secrets().is_err());
        tokens.refresh_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(tokens.secrets().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, r#"{"tokens": {"access_ttl_secs": 60}}"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.tokens.access_ttl_secs, 60);
        assert_eq!(config.tokens.refresh_ttl_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.server.addr.port(), 8080);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("FOLIO_ADDR", "127.0.0.1:9000"),
            ("FOLIO_ACCESS_TOKEN_SECRET", "s1"),
            ("FOLIO_REFRESH_TOKEN_TTL", "120"),
            ("FOLIO_ACCESS_TOKEN_TTL", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(ToString::to_string));

        assert_eq!(config.server.addr.port(), 9000);
        assert_eq!(config.tokens.access_secret.as_deref(), Some("s1"));
        assert_eq!(config.tokens.refresh_ttl_secs, 120);
        assert_eq!(config.tokens.access_ttl_secs, 900);
    }
}
