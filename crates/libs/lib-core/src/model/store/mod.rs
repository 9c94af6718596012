//! # Database Store
//!
//! Database connection pool, schema bootstrap and the chat repository.

// region: --- Modules
pub mod models;
pub mod chat_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use models::ChatMessage;
pub use chat_repository::ChatRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Type alias for SQLite connection pool.
pub type DbPool = SqlitePool;

/// How long a writer waits on SQLite's lock before the insert fails.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a new SQLite connection pool.
///
/// The database file and its parent directory are created if missing.
/// In-memory URLs get a single long-lived connection so every query sees
/// the same database.
pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let in_memory = is_memory_url(database_url);

    if !in_memory {
        ensure_parent_dir(database_url)?;
    }

    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
    };

    let pool = pool_options.connect_with(options).await?;

    Ok(pool)
}

/// Create the `chats` table if it does not exist yet.
///
/// Safe to run on every startup; existing rows are left untouched.
pub async fn init_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            username TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Create the directory holding the database file, if any.
fn ensure_parent_dir(database_url: &str) -> std::io::Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory: {:?}", parent);
        }
    }

    Ok(())
}
// endregion: --- Types and Functions

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_memory_url() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://chat?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite:data/chat.db"));
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO chats (email, username, content, created_at, updated_at) \
             VALUES ('a@b.com', 'alice', 'hi', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();

        init_schema(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
