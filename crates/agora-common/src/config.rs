//! Environment-driven configuration
//!
//! Everything the binaries need comes from the process environment, with a
//! `.env` file folded in first when one exists. Only the bind port and the
//! token secret are required; the rest default to values suited to a
//! single-room deployment.

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Top-level configuration assembled by [`AppConfig::from_env`]
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub token: TokenConfig,
    pub chat: ChatConfig,
}

impl AppConfig {
    /// Load configuration from the environment
    ///
    /// # Errors
    /// Fails when `GATEWAY_PORT` or `JWT_SECRET` is missing, or when a set
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings::from_env(),
            gateway: ServerConfig::from_env()?,
            token: TokenConfig::from_env()?,
            chat: ChatConfig::from_env(),
        })
    }
}

/// Identity of this deployment
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

impl AppSettings {
    fn from_env() -> Self {
        Self {
            name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
            env: Environment::detect(),
        }
    }
}

fn default_app_name() -> String {
    "agora".to_string()
}

/// Deployment environment, from `APP_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Read `APP_ENV`; anything unrecognized counts as development
    #[must_use]
    pub fn detect() -> Self {
        Self::from_name(env::var("APP_ENV").ok().as_deref())
    }

    fn from_name(name: Option<&str>) -> Self {
        match name.map(str::to_ascii_lowercase).as_deref() {
            Some("production") => Self::Production,
            Some("staging") => Self::Staging,
            _ => Self::Development,
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Where the gateway binds
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
            port: required_parsed("GATEWAY_PORT")?,
        })
    }

    /// The `host:port` string to bind or dial
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Token signing material and lifetime
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub secret: String,
    /// Token lifetime in seconds
    #[serde(default = "default_token_expiry")]
    pub expiry: i64,
}

impl TokenConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
            expiry: parsed_or("JWT_TOKEN_EXPIRY", default_token_expiry()),
        })
    }
}

fn default_token_expiry() -> i64 {
    86400 // 24 hours
}

/// Community room behavior knobs
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Default history page size
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    /// How long messages are kept before pruning
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u32,
    /// Ban duration applied when a request does not specify one
    #[serde(default = "default_ban_hours")]
    pub default_ban_hours: u32,
}

impl ChatConfig {
    fn from_env() -> Self {
        Self {
            history_limit: parsed_or("CHAT_HISTORY_LIMIT", default_history_limit()),
            retention_hours: parsed_or("CHAT_RETENTION_HOURS", default_retention_hours()),
            default_ban_hours: parsed_or("CHAT_DEFAULT_BAN_HOURS", default_ban_hours()),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            retention_hours: default_retention_hours(),
            default_ban_hours: default_ban_hours(),
        }
    }
}

fn default_history_limit() -> u32 {
    50
}

fn default_retention_hours() -> u32 {
    48
}

fn default_ban_hours() -> u32 {
    24
}

/// A required variable, which must also parse
fn required_parsed<T: FromStr>(key: &'static str) -> Result<T, ConfigError> {
    let raw = env::var(key).map_err(|_| ConfigError::MissingVar(key))?;
    raw.parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key, raw))
}

/// An optional variable; unset or unparseable falls back
fn parsed_or<T: FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(fallback)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
