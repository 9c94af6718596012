//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! ```rust,no_run
//! use lib_core::Config;
//!
//! let config = Config::from_env().expect("invalid environment");
//! config.validate().expect("invalid configuration");
//! println!("listening on {}", config.bind_address());
//! ```

use crate::error::{AppError, Result};
use lib_utils::envs::{get_env_list, get_env_or, get_env_parse_or};

/// Default SQLite database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/chat.db";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default per-subscriber queue capacity for realtime fan-out.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Interface the HTTP listener binds to
    pub host: String,

    /// Port the HTTP listener binds to
    pub port: u16,

    /// Allowed CORS origins
    ///
    /// Empty means any origin is accepted.
    pub allowed_origins: Vec<String>,

    /// Number of messages buffered per realtime subscriber before
    /// deliveries to that subscriber are dropped.
    pub subscriber_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            allowed_origins: Vec::new(),
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url = get_env_or("DATABASE_URL", DEFAULT_DATABASE_URL);
        let host = get_env_or("HOST", "127.0.0.1");

        let port = get_env_parse_or("PORT", DEFAULT_PORT)
            .map_err(|_| AppError::Config("PORT must be a valid port number".to_string()))?;

        let subscriber_buffer = get_env_parse_or("SUBSCRIBER_BUFFER", DEFAULT_SUBSCRIBER_BUFFER)
            .map_err(|_| AppError::Config("SUBSCRIBER_BUFFER must be a valid number".to_string()))?;

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origins: get_env_list("ALLOWED_ORIGINS"),
            subscriber_buffer,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(AppError::Config("DATABASE_URL cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(AppError::Config("PORT must be between 1 and 65535".to_string()));
        }

        if self.subscriber_buffer == 0 {
            return Err(AppError::Config("SUBSCRIBER_BUFFER must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Address the HTTP listener binds to, as `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        let config = Config {
            subscriber_buffer: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_database_url() {
        let config = Config {
            database_url: "  ".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_config_error_is_a_config_variant() {
        let err = Config {
            port: 0,
            ..Config::default()
        }
        .validate()
        .unwrap_err();

        assert_eq!(err.code(), "Config");
        assert!(err.to_string().contains("PORT"));
    }
}
