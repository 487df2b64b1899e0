//! # configs
//!
//! Layered application configuration. Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `.env` (loaded into the process environment by `dotenvy`)
//! 4. `INNOVATE__SECTION__KEY` environment variables
//!
//! The JWT secret has no default and must be supplied.

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "INNOVATE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be loaded: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub feed: FeedConfig,
    pub reminders: ReminderConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub default_limit: i64,
    pub max_limit: i64,
    pub trending_window_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
    /// An `EnvFilter` directive such as `info,sqlx=warn`.
    pub filter: String,
}

impl AppConfig {
    /// Loads `.env`, then builds the layered configuration from the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    /// Builds the configuration with `env` as the top layer. Tests pass an
    /// `Environment` with an explicit source map.
    pub fn from_env(env: Environment) -> Result<Self, ConfigError> {
        let cfg: AppConfig = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://innovate.db")?
            .set_default("database.max_connections", 10)?
            .set_default("feed.default_limit", 50)?
            .set_default("feed.max_limit", 100)?
            .set_default("feed.trending_window_days", 7)?
            .set_default("reminders.sweep_interval_secs", 30)?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        if self.feed.default_limit < 1 {
            return Err(ConfigError::Invalid("feed.default_limit must be positive".into()));
        }
        if self.feed.max_limit < self.feed.default_limit {
            return Err(ConfigError::Invalid(
                "feed.max_limit must not be below feed.default_limit".into(),
            ));
        }
        if self.feed.trending_window_days < 1 {
            return Err(ConfigError::Invalid("feed.trending_window_days must be positive".into()));
        }
        if self.reminders.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("reminders.sweep_interval_secs must be positive".into()));
        }
        Ok(())
    }
}
