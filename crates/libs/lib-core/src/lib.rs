//! # Core Library
//!
//! Core models, database, configuration, and errors for the chat relay.

pub mod config;
pub mod error;
pub mod model;
pub mod dto;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use dto::ChatForCreate;
pub use model::store::{ChatMessage, ChatRepository, DbPool, create_pool, init_schema};
