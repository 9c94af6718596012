//! # Chat Handlers
//!
//! HTTP and WebSocket handlers for the chat relay.

// region: --- Modules
pub mod send;
pub mod history;
pub mod socket;

// endregion: --- Modules

// region: --- Re-exports
pub use send::handle_send_chat;
pub use history::handle_get_chats;
pub use socket::{handle_chat_socket, ChatEvent, CHAT_MESSAGE_EVENT};
// endregion: --- Re-exports
