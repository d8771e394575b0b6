//! # Sequence Counters
//!
//! Named, monotonically increasing counters. The sale number comes from the
//! `saleId` counter.
//!
//! ```text
//!   INSERT INTO sequences(name, value) VALUES ('saleId', 1)
//!   ON CONFLICT(name) DO UPDATE SET value = value + 1
//!   RETURNING value
//!
//!   first call → 1, then 2, 3, ...   (one statement, no read-then-write)
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Increments `name` and returns the new value, creating the counter at 1.
///
/// Runs on the caller's connection so the number is rolled back with the
/// transaction that asked for it.
pub async fn next_value(conn: &mut SqliteConnection, name: &str) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sequences (name, value) VALUES (?1, 1)
        ON CONFLICT(name) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    debug!(sequence = %name, value, "Sequence advanced");
    Ok(value)
}

#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Increments outside of any caller transaction.
    pub async fn next(&self, name: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        next_value(&mut conn, name).await
    }

    /// Last value handed out, if the counter exists.
    pub async fn current(&self, name: &str) -> DbResult<Option<i64>> {
        let value: Option<i64> = sqlx::query_scalar("SELECT value FROM sequences WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }
}
