//! Configuration loading for the Event Catalog service.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `CATALOG_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const ENV_PREFIX: &str = "CATALOG_";

/// Application configuration derived from `CATALOG_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Remote XML feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FeedConfig {
    /// Endpoint fetched once per ingestion run.
    ///
    /// Environment variable: `CATALOG_FEED_URL`
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Upper bound for the whole feed request, in seconds.
    ///
    /// Environment variable: `CATALOG_FEED_TIMEOUT_SECONDS`
    #[serde(default = "default_feed_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Ingestion scheduling and audit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct IngestConfig {
    /// Seconds between scheduled runs. `None` disables the in-process scheduler.
    ///
    /// Environment variable: `CATALOG_INGEST_INTERVAL_SECONDS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,

    /// Application tag written with every audit log entry.
    ///
    /// Environment variable: `CATALOG_AUDIT_APPLICATION`
    #[serde(default = "default_audit_application")]
    pub audit_application: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            feed: FeedConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout_seconds: default_feed_timeout_seconds(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval_seconds: None,
            audit_application: default_audit_application(),
        }
    }
}

impl FeedConfig {
    /// Validate the feed endpoint and timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.url).map_err(|source| ConfigError::InvalidFeedUrl {
            value: self.url.clone(),
            reason: source.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidFeedUrl {
                value: self.url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if self.timeout_seconds == 0 || self.timeout_seconds > 300 {
            return Err(ConfigError::InvalidFeedTimeout {
                value: self.timeout_seconds,
            });
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl IngestConfig {
    /// Validate scheduling bounds and the audit tag length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(value) = self.interval_seconds
            && !(60..=86_400).contains(&value)
        {
            return Err(ConfigError::InvalidIngestInterval { value });
        }

        // log_entries.application is VARCHAR(32)
        if self.audit_application.is_empty() || self.audit_application.len() > 32 {
            return Err(ConfigError::InvalidAuditApplication {
                value: self.audit_application.clone(),
            });
        }

        Ok(())
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval_seconds.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a redacted JSON representation (database credentials are masked).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        config.database_url = redact_url_credentials(&config.database_url);
        config.feed.url = redact_url_credentials(&config.feed.url);
        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning an error on out-of-range settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidDbMaxConnections {
                value: self.db_max_connections,
            });
        }

        self.feed.validate()?;
        self.ingest.validate()?;

        Ok(())
    }
}

fn redact_url_credentials(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            // set_username/set_password only fail for cannot-be-a-base URLs
            let _ = url.set_username("[REDACTED]");
            if url.password().is_some() {
                let _ = url.set_password(Some("[REDACTED]"));
            }
            url.to_string()
        }
        _ => raw.to_string(),
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://event_catalog.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_feed_url() -> String {
    "https://provider.code-challenge.feverup.com/api/events".to_string()
}

fn default_feed_timeout_seconds() -> u64 {
    30
}

fn default_audit_application() -> String {
    "get_events".to_string()
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("database max connections must be positive, got {value}")]
    InvalidDbMaxConnections { value: u32 },
    #[error("invalid feed url '{value}': {reason}")]
    InvalidFeedUrl { value: String, reason: String },
    #[error("feed timeout must be between 1 and 300 seconds, got {value}")]
    InvalidFeedTimeout { value: u64 },
    #[error("ingest interval must be between 60 and 86400 seconds, got {value}")]
    InvalidIngestInterval { value: u64 },
    #[error("invalid value '{value}' for {key}; expected an unsigned integer")]
    InvalidNumber { key: String, value: String },
    #[error("audit application tag must be 1 to 32 characters, got '{value}'")]
    InvalidAuditApplication { value: String },
}

/// Loads configuration using layered `.env` files and `CATALOG_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads the layered configuration and validates it.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);
        let db_max_connections = layered
            .remove("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = layered
            .remove("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);

        let feed = FeedConfig {
            url: layered
                .remove("FEED_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_feed_url),
            timeout_seconds: parse_u64(&mut layered, "FEED_TIMEOUT_SECONDS")?
                .unwrap_or_else(default_feed_timeout_seconds),
        };

        let ingest = IngestConfig {
            interval_seconds: parse_u64(&mut layered, "INGEST_INTERVAL_SECONDS")?,
            audit_application: layered
                .remove("AUDIT_APPLICATION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_audit_application),
        };

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            feed,
            ingest,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Empty values count as unset; anything else must be a valid `u64`.
fn parse_u64(layered: &mut BTreeMap<String, String>, key: &str) -> Result<Option<u64>, ConfigError> {
    match layered.remove(key).map(|v| v.trim().to_string()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                key: format!("{ENV_PREFIX}{key}"),
                value: v,
            }),
    }
}
