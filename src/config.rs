//! Process settings.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{Authenticator, ADMIN_LOGIN, ADMIN_SALT, SALT};
use crate::store::RetryConfig;

/// Settings file name, looked up in the working directory (extension optional).
pub const CONFIG_FILE: &str = "scoring-api";
/// Environment prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "SCORING_API";

/// Server and scoring settings.
///
/// Every field has a default, so an empty environment yields a working
/// local server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Listen address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log file; stdout when unset.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines.
    #[serde(default)]
    pub log_json: bool,

    /// Shared salt for user tokens.
    #[serde(default = "default_salt")]
    pub salt: String,

    /// Admin token salt.
    #[serde(default = "default_admin_salt")]
    pub admin_salt: String,

    /// Privileged login.
    #[serde(default = "default_admin_login")]
    pub admin_login: String,

    /// Score cache freshness window, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Extra attempts on the durable store path.
    #[serde(default = "default_store_retries")]
    pub store_retries: u32,

    /// Pause between durable store attempts, in milliseconds.
    #[serde(default = "default_store_retry_delay_ms")]
    pub store_retry_delay_ms: u64,

    /// Request body limit, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            log_file: None,
            log_level: default_log_level(),
            log_json: false,
            salt: default_salt(),
            admin_salt: default_admin_salt(),
            admin_login: default_admin_login(),
            cache_ttl_secs: default_cache_ttl_secs(),
            store_retries: default_store_retries(),
            store_retry_delay_ms: default_store_retry_delay_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Settings {
    /// Loads `scoring-api.{toml,yaml,json}` if present, then overlays
    /// `SCORING_API__*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Address to bind.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr.parse()?)
    }

    /// Authenticator for the configured salts.
    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(&self.salt, &self.admin_salt, &self.admin_login)
    }

    /// Score cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Retry policy for the durable store path.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::default()
            .with_max_retries(self.store_retries)
            .with_delay(Duration::from_millis(self.store_retry_delay_ms))
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_salt() -> String {
    SALT.to_string()
}

fn default_admin_salt() -> String {
    ADMIN_SALT.to_string()
}

fn default_admin_login() -> String {
    ADMIN_LOGIN.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60 * 60
}

fn default_store_retries() -> u32 {
    5
}

fn default_store_retry_delay_ms() -> u64 {
    1000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.log_file, None);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(settings.retry().max_retries, 5);
        assert_eq!(settings.retry().delay, Duration::from_secs(1));
        assert_eq!(settings.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_socket_addr() {
        let addr = Settings::default().socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_bad_socket_addr() {
        let settings = Settings {
            bind_addr: "not an address".to_string(),
            ..Settings::default()
        };
        assert!(settings.socket_addr().is_err());
    }

    #[test]
    fn test_partial_source_uses_defaults() {
        let settings: Settings = config::Config::builder()
            .set_override("port", 9090)
            .unwrap()
            .set_override("salt", "pepper")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.port, 9090);
        assert_eq!(settings.admin_login, "admin");
        assert_eq!(settings.cache_ttl_secs, 3600);

        let now = Utc::now();
        assert_ne!(
            settings.authenticator().expected_token(Some("a"), "b", now).expose_secret(),
            Settings::default().authenticator().expected_token(Some("a"), "b", now).expose_secret()
        );
    }
}
