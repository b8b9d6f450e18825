//! Database access layer implementing the repository pattern for message
//! persistence.
//!
//! All database operations go through these repositories; SQL lives nowhere
//! else. The backing engine is SQLite through `sqlx`, and the uniqueness of
//! `message_id` is enforced by the table's primary key.

use std::{str::FromStr, sync::Arc, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};
use tracing::debug;

pub mod messages;

use crate::error::{CoreError, Result};

/// Container for all repository instances providing unified database access.
#[derive(Clone)]
pub struct Storage {
    /// Repository for message operations.
    pub messages: Arc<messages::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        let pool = Arc::new(pool);

        Self { messages: Arc::new(messages::Repository::new(pool)) }
    }

    /// Creates the `messages` table and its indexes if they are missing.
    ///
    /// Idempotent; runs at startup and in test setup.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if any DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        let pool = self.messages.pool();

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                message_id  TEXT PRIMARY KEY NOT NULL,
                from_msisdn TEXT NOT NULL,
                to_msisdn   TEXT NOT NULL,
                ts          TEXT NOT NULL,
                text        TEXT,
                created_at  TEXT NOT NULL
            )
            ",
        )
        .execute(&*pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_ts ON messages(ts, message_id)")
            .execute(&*pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_from ON messages(from_msisdn)")
            .execute(&*pool)
            .await?;

        debug!("message schema ensured");
        Ok(())
    }

    /// Performs a health check on the database connection.
    ///
    /// Used by the readiness and health endpoints.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.messages.pool()).await?;

        Ok(())
    }
}

/// Builds connection options for a SQLite URL.
///
/// Creates the database file when missing and enables WAL so readers do not
/// block the single writer.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if the URL cannot be parsed.
pub fn connect_options(database_url: &str) -> Result<SqliteConnectOptions> {
    if !database_url.starts_with("sqlite:") {
        return Err(CoreError::InvalidInput(format!(
            "expected a sqlite: database url, got scheme of {}",
            database_url.split(':').next().unwrap_or_default()
        )));
    }

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| CoreError::InvalidInput(format!("invalid database url: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_options_accept_memory_and_file_urls() {
        assert!(connect_options("sqlite::memory:").is_ok());
        assert!(connect_options("sqlite:///data/app.db").is_ok());
    }

    #[test]
    fn connect_options_reject_foreign_schemes() {
        let err = connect_options("postgresql://localhost/hookbox").unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }
}
