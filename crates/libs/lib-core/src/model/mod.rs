//! # Model Layer
//!
//! Persistence for the chat relay. See [`store`].

pub mod store;
