//! # Chat History Handler

use axum::{extract::State, Json};
use lib_core::{ChatMessage, ChatRepository, DbPool, Result};

/// Return every stored message, newest first.
///
/// **Route**: `GET /getchats`
pub async fn handle_get_chats(State(db): State<DbPool>) -> Result<Json<Vec<ChatMessage>>> {
    let chats = ChatRepository::list_all(&db).await?;
    tracing::debug!(count = chats.len(), "[CHAT] HISTORY");
    Ok(Json(chats))
}
