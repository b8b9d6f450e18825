//! Repository for message database operations.
//!
//! Point lookup, conflict-safe insert, filtered listing, and aggregate
//! statistics over the append-only `messages` table.

use std::sync::Arc;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::{CoreError, Result},
    models::{Message, MessageFilter, MessagePage, MessageStats, SenderCount},
};

/// Number of senders reported by `stats`.
pub const TOP_SENDERS_LIMIT: i64 = 10;

/// Repository for message database operations.
pub struct Repository {
    pool: Arc<SqlitePool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<SqlitePool> {
        self.pool.clone()
    }

    /// Finds a message by its identifier.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r"
            SELECT message_id, from_msisdn, to_msisdn, ts, text, created_at
            FROM messages
            WHERE message_id = ?
            ",
        )
        .bind(message_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(message)
    }

    /// Inserts a message unless its identifier is already stored.
    ///
    /// The conflict check and the write are a single statement, so of any
    /// number of concurrent inserts for one id exactly one succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::AlreadyExists` if the id is taken, or a database
    /// error if the write fails.
    pub async fn insert(&self, message: &Message) -> Result<()> {
        let result = sqlx::query(
            r"
            INSERT INTO messages (message_id, from_msisdn, to_msisdn, ts, text, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(message_id) DO NOTHING
            ",
        )
        .bind(&message.message_id)
        .bind(&message.from_msisdn)
        .bind(&message.to_msisdn)
        .bind(&message.ts)
        .bind(&message.text)
        .bind(&message.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                CoreError::AlreadyExists { message_id: message.message_id.clone() }
            },
            other => CoreError::from(other),
        })?;

        if result.rows_affected() == 0 {
            return Err(CoreError::AlreadyExists { message_id: message.message_id.clone() });
        }

        Ok(())
    }

    /// Lists messages matching `filter`, ascending by `(ts, message_id)`.
    ///
    /// The page and the total are read in one transaction so they agree.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for a negative limit or offset, or
    /// a database error if either query fails.
    pub async fn list(
        &self,
        filter: &MessageFilter,
        limit: i64,
        offset: i64,
    ) -> Result<MessagePage> {
        if limit < 0 || offset < 0 {
            return Err(CoreError::InvalidInput(format!(
                "limit and offset must be non-negative, got limit={limit} offset={offset}"
            )));
        }

        let filter = filter.clone().normalized();
        let mut tx = self.pool.begin().await?;

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM messages");
        push_filters(&mut count_query, &filter);
        let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        let mut page_query = QueryBuilder::<Sqlite>::new(
            "SELECT message_id, from_msisdn, to_msisdn, ts, text, created_at FROM messages",
        );
        push_filters(&mut page_query, &filter);
        page_query
            .push(" ORDER BY ts ASC, message_id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let items: Vec<Message> = page_query.build_query_as::<Message>().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        Ok(MessagePage { items, total })
    }

    /// Computes aggregate statistics over all stored messages.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn stats(&self) -> Result<MessageStats> {
        let mut tx = self.pool.begin().await?;

        let (total_messages, senders_count, first_ts, last_ts): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = sqlx::query_as(
            r"
            SELECT COUNT(*), COUNT(DISTINCT from_msisdn), MIN(ts), MAX(ts)
            FROM messages
            ",
        )
        .fetch_one(&mut *tx)
        .await?;

        let top_senders = sqlx::query_as::<_, SenderCount>(
            r"
            SELECT from_msisdn, COUNT(*) AS count
            FROM messages
            GROUP BY from_msisdn
            ORDER BY count DESC, from_msisdn ASC
            LIMIT ?
            ",
        )
        .bind(TOP_SENDERS_LIMIT)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(MessageStats { total_messages, senders_count, top_senders, first_ts, last_ts })
    }

    /// Counts all stored messages.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages").fetch_one(&*self.pool).await?;

        Ok(count.0)
    }
}

/// Appends the conjunctive WHERE clause for a normalized filter.
fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &MessageFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(from) = &filter.from {
        query.push(" AND from_msisdn = ").push_bind(from.clone());
    }

    if let Some(since) = &filter.since {
        query.push(" AND ts >= ").push_bind(since.clone());
    }

    // instr() is case-sensitive and takes the needle literally, unlike LIKE
    if let Some(needle) = &filter.text_contains {
        query.push(" AND instr(text, ").push_bind(needle.clone()).push(") > 0");
    }
}
