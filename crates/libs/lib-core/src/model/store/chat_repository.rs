//! # Chat Repository
//!
//! Append-only store of chat messages.
//!
//! Inserts are a single `INSERT ... RETURNING` statement: SQLite assigns the
//! `AUTOINCREMENT` id under its write lock, so concurrent inserts never share
//! an id and a row is either fully visible or absent.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lib_core::{ChatForCreate, ChatRepository, create_pool, init_schema};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = create_pool("sqlite:data/chat.db").await?;
//! init_schema(&pool).await?;
//!
//! let chat = ChatRepository::create(&pool, ChatForCreate::new("a@b.com", "alice", "hi")).await?;
//! println!("Stored chat {}", chat.id);
//!
//! let history = ChatRepository::list_all(&pool).await?;
//! assert_eq!(history[0].id, chat.id);
//! # Ok(())
//! # }
//! ```

use super::models::ChatMessage;
use super::DbPool;
use crate::dto::ChatForCreate;
use crate::error::Result;
use lib_utils::time::now_utc;
use sqlx::query_as;

/// Chat repository for database operations.
pub struct ChatRepository;

impl ChatRepository {
    /// Validate and persist a new chat message.
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - The stored record with its assigned id and timestamps
    /// * `Err(AppError::Validation)` - A required field is empty; nothing is written
    /// * `Err(AppError::Storage)` - The database write failed
    pub async fn create(pool: &DbPool, chat_c: ChatForCreate) -> Result<ChatMessage> {
        chat_c.validate()?;

        let now = now_utc();

        let chat = query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chats (email, username, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, email, username, content, created_at, updated_at
            "#
        )
        .bind(&chat_c.email)
        .bind(&chat_c.username)
        .bind(&chat_c.content)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        tracing::debug!(chat_id = chat.id, username = %chat.username, "[CHAT] Stored message");

        Ok(chat)
    }

    /// Every stored message, most recent first.
    pub async fn list_all(pool: &DbPool) -> Result<Vec<ChatMessage>> {
        let chats = query_as::<_, ChatMessage>(
            r#"
            SELECT id, email, username, content, created_at, updated_at
            FROM chats
            ORDER BY id DESC
            "#
        )
        .fetch_all(pool)
        .await?;

        Ok(chats)
    }

    /// Number of stored messages.
    pub async fn count(pool: &DbPool) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM chats")
            .fetch_one(pool)
            .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::model::store::{create_pool, init_schema};
    use std::collections::HashSet;

    async fn setup_test_db() -> DbPool {
        let pool = create_pool("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        init_schema(&pool)
            .await
            .expect("Failed to create chats table");

        pool
    }

    #[tokio::test]
    async fn test_create_chat() {
        let pool = setup_test_db().await;

        let chat = ChatRepository::create(&pool, ChatForCreate::new("a@b.com", "alice", "hi"))
            .await
            .unwrap();

        assert!(chat.id > 0);
        assert_eq!(chat.email, "a@b.com");
        assert_eq!(chat.username, "alice");
        assert_eq!(chat.content, "hi");
        assert_eq!(chat.created_at, chat.updated_at);
    }

    #[tokio::test]
    async fn test_list_all_is_newest_first() {
        let pool = setup_test_db().await;

        let mut ids = Vec::new();
        for i in 0..5 {
            let chat = ChatRepository::create(
                &pool,
                ChatForCreate::new("a@b.com", "alice", format!("message {}", i)),
            )
            .await
            .unwrap();
            ids.push(chat.id);
        }

        let history = ChatRepository::list_all(&pool).await.unwrap();
        let listed: Vec<i64> = history.iter().map(|c| c.id).collect();

        ids.reverse();
        assert_eq!(listed, ids);
        assert!(listed.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(history[0].content, "message 4");
    }

    #[tokio::test]
    async fn test_rejected_chat_is_not_stored() {
        let pool = setup_test_db().await;

        ChatRepository::create(&pool, ChatForCreate::new("a@b.com", "alice", "first"))
            .await
            .unwrap();

        let result = ChatRepository::create(&pool, ChatForCreate::new("a@b.com", "alice", "")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = ChatRepository::create(&pool, ChatForCreate::new("", "x", "y")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        assert_eq!(ChatRepository::count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let pool = setup_test_db().await;

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    ChatRepository::create(
                        &pool,
                        ChatForCreate::new("a@b.com", "alice", format!("concurrent {}", i)),
                    )
                    .await
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let chat = handle.await.unwrap().unwrap();
            assert!(ids.insert(chat.id), "duplicate id {}", chat.id);
        }

        let history = ChatRepository::list_all(&pool).await.unwrap();
        assert_eq!(history.len(), 100);
        let contents: HashSet<String> = history.into_iter().map(|c| c.content).collect();
        assert_eq!(contents.len(), 100);
    }

    #[tokio::test]
    async fn test_storage_failure_without_schema() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let result = ChatRepository::create(&pool, ChatForCreate::new("a@b.com", "alice", "hi")).await;
        assert!(matches!(result, Err(AppError::Storage(_))));

        let result = ChatRepository::list_all(&pool).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
