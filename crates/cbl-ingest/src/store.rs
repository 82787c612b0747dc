//! Storage seam
//!
//! [`ClientStore`] is the narrow interface the pipeline talks to; the rest of
//! the crate never sees sqlx types. [`PgClientStore`] is the PostgreSQL
//! implementation. Tests substitute an in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::record::ClientRecord;

/// Storage failures, split by blast radius
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store rejected a statement; other statements may still succeed
    #[error("database error: {0}")]
    Database(String),

    /// The connection itself is gone; no further statement can succeed
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

impl From<StoreError> for cbl_common::ImportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConnectionLost(message) => Self::ConnectionLost(message),
            StoreError::Database(message) => Self::Database(message),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Protocol(_) => StoreError::ConnectionLost(err.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Narrow interface over the target store
///
/// Append-only: no updates, no deletes, no transactions spanning calls. Each
/// call is its own unit of work.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Insert a whole batch in a single statement
    async fn insert_batch(&self, records: &[ClientRecord]) -> Result<(), StoreError>;

    /// Insert a single record
    async fn insert_one(&self, record: &ClientRecord) -> Result<(), StoreError>;

    /// Append one rejected line to the error table
    async fn record_rejection(
        &self,
        raw_line: &str,
        reason: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store for the `clients` and `import_errors` tables
pub struct PgClientStore {
    pool: PgPool,
}

impl PgClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn insert_batch(&self, records: &[ClientRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut query_builder = sqlx::QueryBuilder::new(
            "INSERT INTO clients (full_name, national_id, status, admission_date, \
             is_politically_exposed, is_obligated_subject) ",
        );

        query_builder.push_values(records, |mut b, record| {
            b.push_bind(&record.full_name)
                .push_bind(record.national_id)
                .push_bind(&record.status)
                .push_bind(record.admission_date)
                .push_bind(record.is_politically_exposed)
                .push_bind(record.is_obligated_subject);
        });

        query_builder.build().execute(&self.pool).await?;
        debug!(count = records.len(), "Bulk insert committed");
        Ok(())
    }

    async fn insert_one(&self, record: &ClientRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO clients (full_name, national_id, status, admission_date, \
             is_politically_exposed, is_obligated_subject) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&record.full_name)
        .bind(record.national_id)
        .bind(&record.status)
        .bind(record.admission_date)
        .bind(record.is_politically_exposed)
        .bind(record.is_obligated_subject)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_rejection(
        &self,
        raw_line: &str,
        reason: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO import_errors (raw_line, reason, created_at) VALUES ($1, $2, $3)")
            .bind(raw_line)
            .bind(reason)
            .bind(occurred_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_classified_as_connection_lost() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::ConnectionLost(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::ConnectionLost(_)
        ));
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(matches!(
            StoreError::from(io),
            StoreError::ConnectionLost(_)
        ));
    }

    #[test]
    fn test_statement_errors_classified_as_database() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
