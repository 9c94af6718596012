//! # Chat Module
//!
//! Chat relay endpoints and the realtime broadcast hub.
//!
//! Messages are submitted with `POST /sendchat`, stored, then fanned out over
//! WebSocket (`GET /socket`) to every connected client. `GET /getchats`
//! returns the stored history, newest first.

pub mod hub;
pub mod handlers;

pub use hub::{ChatHub, FanOut, SubscriberId, Subscription};
pub use handlers::{handle_chat_socket, handle_get_chats, handle_send_chat, ChatEvent, CHAT_MESSAGE_EVENT};
