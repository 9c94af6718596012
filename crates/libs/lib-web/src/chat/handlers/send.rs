//! # Chat Submission Handler
//!
//! `POST /sendchat`: store a message, then publish it to realtime subscribers.

use crate::chat::hub::ChatHub;
use axum::{body::Bytes, extract::State, http::StatusCode};
use lib_core::{AppError, ChatForCreate, ChatRepository, DbPool, Result};
use std::sync::Arc;
use tracing::info;

/// Handle a chat submission.
///
/// **Route**: `POST /sendchat`
///
/// Body: `{"email": "...", "username": "...", "content": "..."}`.
///
/// Returns `201 Created` with an empty body once the message is stored. Any
/// failure (malformed JSON, empty field, database error) is a `500` with an
/// empty body and nothing is published.
///
/// The message is published only after the insert has returned, so a
/// subscriber never sees a message that `GET /getchats` cannot return.
pub async fn handle_send_chat(
    State(db): State<DbPool>,
    State(hub): State<Arc<ChatHub>>,
    body: Bytes,
) -> Result<StatusCode> {
    let chat_c: ChatForCreate = serde_json::from_slice(&body)?;

    // Store and publish run detached from the request, so a caller that
    // gives up mid-request cancels neither the write nor the broadcast.
    tokio::spawn(async move {
        let chat = ChatRepository::create(&db, chat_c).await?;

        info!(
            chat_id = chat.id,
            username = %chat.username,
            "[CHAT] STORED chat_id={} username={}",
            chat.id,
            chat.username
        );

        hub.publish(chat).await;
        Ok::<(), AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Submit task failed: {}", e)))??;

    Ok(StatusCode::CREATED)
}
