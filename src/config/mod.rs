//! Configuration module for the content backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Secret used when `HTML_EDITOR_JWT_SECRET` is not set. Only suitable for local development.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me-in-production";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid HTML_EDITOR_BIND_ADDR {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid HTML_EDITOR_LOG_FORMAT {0:?} (expected \"text\" or \"json\")")]
    LogFormat(String),
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("HTML_EDITOR_DB_PATH")
            .unwrap_or_else(|_| "./data/content.sqlite".to_string())
            .into();

        let bind_value =
            env::var("HTML_EDITOR_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_value
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                value: bind_value.clone(),
                source,
            })?;

        let log_level = env::var("HTML_EDITOR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let format_value =
            env::var("HTML_EDITOR_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
        let log_format =
            LogFormat::parse(&format_value).ok_or(ConfigError::LogFormat(format_value))?;

        let jwt_secret =
            env::var("HTML_EDITOR_JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            jwt_secret,
        })
    }

    /// Whether the server is running with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
