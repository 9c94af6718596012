//! # Chat WebSocket Handler
//!
//! Realtime feed of newly stored chat messages.
//!
//! ## Endpoint
//!
//! - `GET /socket` - WebSocket upgrade; one text frame per stored message

use crate::chat::hub::{ChatHub, Subscription};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use lib_core::{AppError, ChatMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Event name carried by every chat frame.
pub const CHAT_MESSAGE_EVENT: &str = "chat message";

/// Frame sent to WebSocket clients.
///
/// ```json
/// {
///   "event": "chat message",
///   "data": {
///     "id": 42,
///     "email": "a@b.com",
///     "username": "alice",
///     "content": "hi",
///     "createdAt": "2024-01-01T12:00:00Z",
///     "updatedAt": "2024-01-01T12:00:00Z"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub event: String,
    pub data: ChatMessage,
}

impl ChatEvent {
    pub fn chat_message(chat: ChatMessage) -> Self {
        Self {
            event: CHAT_MESSAGE_EVENT.to_string(),
            data: chat,
        }
    }
}

/// WebSocket handler for the realtime chat feed.
///
/// **Route**: `GET /socket`
///
/// The subscription is registered before the upgrade completes, so anything
/// stored after the handshake reaches the client.
///
/// ```javascript
/// const ws = new WebSocket('ws://localhost:8000/socket');
/// ws.onmessage = (event) => {
///   const { data } = JSON.parse(event.data);
///   console.log(`${data.username}: ${data.content}`);
/// };
/// ```
pub async fn handle_chat_socket(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(hub): State<Arc<ChatHub>>,
) -> Response {
    let client_ip = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or("").trim().to_string())
        .filter(|s| !s.is_empty());

    let subscription = hub.subscribe().await;
    let subscriber_id = subscription.id();

    info!(
        subscriber_id = %subscriber_id,
        client_ip = ?client_ip,
        "[WS] CONNECT_ATTEMPT subscriber={} ip={:?}",
        subscriber_id,
        client_ip
    );

    ws.on_upgrade(move |socket| handle_socket(socket, hub, subscription, client_ip))
        .into_response()
}

/// Drive one WebSocket connection until either side goes away.
async fn handle_socket(
    socket: WebSocket,
    hub: Arc<ChatHub>,
    mut subscription: Subscription,
    client_ip: Option<String>,
) {
    let subscriber_id = subscription.id();
    let (mut sender, mut receiver) = socket.split();
    let connection_start = Instant::now();
    let messages_sent = Arc::new(AtomicU64::new(0));

    info!(
        subscriber_id = %subscriber_id,
        client_ip = ?client_ip,
        "[WS] CONNECTED subscriber={} ip={:?}",
        subscriber_id,
        client_ip
    );

    let messages_sent_send = Arc::clone(&messages_sent);
    let mut send_task = tokio::spawn(async move {
        while let Some(chat) = subscription.recv().await {
            let event = ChatEvent::chat_message(chat.as_ref().clone());
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!(
                        subscriber_id = %subscriber_id,
                        error = %e,
                        "[WS] SERIALIZE_ERROR subscriber={} error={}",
                        subscriber_id,
                        e
                    );
                    continue;
                }
            };

            if let Err(e) = sender.send(Message::Text(json.into())).await {
                let err = AppError::Connection(e.to_string());
                warn!(
                    subscriber_id = %subscriber_id,
                    error = %err,
                    "[WS] SEND_ERROR subscriber={} error={}",
                    subscriber_id,
                    err
                );
                return;
            }

            messages_sent_send.fetch_add(1, Ordering::Relaxed);
        }

        // Hub closed the subscription (shutdown or removal).
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    debug!(subscriber_id = %subscriber_id, "[WS] CLOSE_RECEIVED");
                    break;
                }
                Ok(_) => {
                    // Inbound frames carry nothing for the relay.
                }
                Err(e) => {
                    let err = AppError::Connection(e.to_string());
                    warn!(
                        subscriber_id = %subscriber_id,
                        error = %err,
                        "[WS] RECV_ERROR subscriber={} error={}",
                        subscriber_id,
                        err
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        result = &mut send_task => {
            recv_task.abort();
            if let Err(e) = result {
                error!(subscriber_id = %subscriber_id, error = ?e, "[WS] SEND_TASK_ERROR");
            }
        }
        result = &mut recv_task => {
            send_task.abort();
            if let Err(e) = result {
                error!(subscriber_id = %subscriber_id, error = ?e, "[WS] RECV_TASK_ERROR");
            }
        }
    }

    hub.unsubscribe(subscriber_id).await;

    let duration = connection_start.elapsed();
    info!(
        subscriber_id = %subscriber_id,
        client_ip = ?client_ip,
        duration_ms = duration.as_millis(),
        messages_sent = messages_sent.load(Ordering::Relaxed),
        "[WS] DISCONNECTED subscriber={} duration={:.2}s",
        subscriber_id,
        duration.as_secs_f64()
    );
}
