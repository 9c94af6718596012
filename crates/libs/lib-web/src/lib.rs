//! # Web Library
//!
//! HTTP handlers, the realtime broadcast hub, middleware, and server startup
//! for the chat relay.
//!
//! ## Endpoints
//!
//! ```bash
//! curl -X POST http://localhost:8000/sendchat \
//!   -H 'content-type: application/json' \
//!   -d '{"email":"a@b.com","username":"alice","content":"hi"}'
//!
//! curl http://localhost:8000/getchats
//! ```
//!
//! Realtime updates: WebSocket at `ws://localhost:8000/socket`.

pub mod chat;
pub mod middleware;
pub mod server;

pub use server::{create_router, init_tracing, start_server, AppState, ServerConfig};
