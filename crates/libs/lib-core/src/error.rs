//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used across
//! the store, the broadcast hub and the HTTP handlers. It follows the `thiserror`
//! pattern for ergonomic error handling.
//!
//! ## Error Categories
//!
//! - [`Validation`](AppError::Validation): a required chat field is missing or
//!   empty, or the request body is not valid JSON. Never reaches the database.
//! - [`Storage`](AppError::Storage): a read or write against SQLite failed.
//! - [`Connection`](AppError::Connection): a realtime transport failure. Always
//!   contained in the connection task and never fatal to the process.
//! - [`Config`](AppError::Config) / [`Internal`](AppError::Internal): startup and
//!   unexpected failures.
//!
//! ## HTTP Mapping
//!
//! The chat API reports every failure as `500 Internal Server Error` with an
//! empty body; clients treat anything other than the success status as failure.
//! Details only go to the server log.
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn require_content(content: &str) -> Result<()> {
//!     if content.is_empty() {
//!         return Err(AppError::Validation("content cannot be empty".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;
use axum::{http::StatusCode, response::{IntoResponse, Response}};

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or empty required field, or an unparseable request body.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database read or write failure (connection, disk, constraint).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Realtime transport failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (unexpected failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Short name of the variant, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::Storage(_) => "Storage",
            AppError::Connection(_) => "Connection",
            AppError::Config(_) => "Config",
            AppError::Internal(_) => "Internal",
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            AppError::Validation(_) => {
                tracing::warn!(code = self.code(), "Rejected request: {}", self);
            }
            _ => {
                tracing::error!(code = self.code(), "Server error: {}", self);
            }
        }

        status.into_response()
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                AppError::Storage(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Storage(format!("Database error: {}", err)),
        }
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}
