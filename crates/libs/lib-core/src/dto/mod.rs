//! # Data Transfer Objects (DTOs)
//!
//! Request structures accepted by the HTTP API.

pub mod chat;

pub use chat::*;
