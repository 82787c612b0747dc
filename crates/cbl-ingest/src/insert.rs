//! Two-tier batch insertion
//!
//! The common case is one bulk statement per batch. When the bulk statement
//! fails, the batch degrades to per-record inserts so one bad record costs one
//! row, not the whole batch. Connection loss is the only failure that
//! propagates out.

use std::sync::Arc;

use tracing::warn;

use crate::batch::PendingRecord;
use crate::record::{ClientRecord, RejectReason};
use crate::store::{ClientStore, StoreError};

/// Result of attempting to insert one batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub inserted: usize,
    /// Raw line and reason for each record the store refused individually
    pub failures: Vec<(String, RejectReason)>,
}

/// Performs bulk inserts with per-record fallback
pub struct Inserter {
    store: Arc<dyn ClientStore>,
}

impl Inserter {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    /// Insert a batch, falling back to per-record inserts on bulk failure
    ///
    /// A bulk failure is not retried as a whole before degrading; transient
    /// faults surface as per-record failures on the fallback pass.
    pub async fn insert_batch(
        &self,
        batch: &[PendingRecord],
    ) -> Result<BatchOutcome, StoreError> {
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let records: Vec<ClientRecord> = batch.iter().map(|p| p.record.clone()).collect();
        match self.store.insert_batch(&records).await {
            Ok(()) => Ok(BatchOutcome {
                inserted: batch.len(),
                failures: Vec::new(),
            }),
            Err(StoreError::ConnectionLost(message)) => Err(StoreError::ConnectionLost(message)),
            Err(StoreError::Database(message)) => {
                warn!(
                    batch_size = batch.len(),
                    error = %message,
                    "Bulk insert failed, falling back to per-record inserts"
                );
                self.insert_individually(batch).await
            },
        }
    }

    async fn insert_individually(
        &self,
        batch: &[PendingRecord],
    ) -> Result<BatchOutcome, StoreError> {
        let mut outcome = BatchOutcome::default();
        for pending in batch {
            match self.store.insert_one(&pending.record).await {
                Ok(()) => outcome.inserted += 1,
                Err(StoreError::ConnectionLost(message)) => {
                    return Err(StoreError::ConnectionLost(message));
                },
                Err(StoreError::Database(message)) => {
                    outcome
                        .failures
                        .push((pending.raw_line.clone(), RejectReason::Insert(message)));
                },
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, Utc};
    use std::sync::Mutex;

    /// Store double: the bulk path always fails, individual inserts fail for
    /// one configured national id.
    struct FlakyStore {
        bad_id: i64,
        inserted: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl ClientStore for FlakyStore {
        async fn insert_batch(&self, _records: &[ClientRecord]) -> Result<(), StoreError> {
            Err(StoreError::Database("bulk statement rejected".to_string()))
        }

        async fn insert_one(&self, record: &ClientRecord) -> Result<(), StoreError> {
            if record.national_id == self.bad_id {
                return Err(StoreError::Database("value out of range".to_string()));
            }
            self.inserted.lock().unwrap().push(record.national_id);
            Ok(())
        }

        async fn record_rejection(
            &self,
            _raw_line: &str,
            _reason: &str,
            _occurred_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn pending(id: i64) -> PendingRecord {
        PendingRecord {
            record: ClientRecord {
                full_name: "Test Client".to_string(),
                national_id: id,
                status: "Activo".to_string(),
                admission_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                is_politically_exposed: false,
                is_obligated_subject: None,
            },
            raw_line: format!("Test|Client|{}|Activo|2023-01-01", id),
        }
    }

    #[tokio::test]
    async fn test_one_bad_record_costs_one_row() {
        let store = Arc::new(FlakyStore {
            bad_id: 42,
            inserted: Mutex::new(Vec::new()),
        });
        let inserter = Inserter::new(store.clone());

        let batch: Vec<PendingRecord> = (1..=100).map(pending).collect();
        let outcome = inserter.insert_batch(&batch).await.unwrap();

        assert_eq!(outcome.inserted, 99);
        assert_eq!(outcome.failures.len(), 1);
        let (raw, reason) = &outcome.failures[0];
        assert!(raw.contains("|42|"));
        assert!(matches!(reason, RejectReason::Insert(_)));
        assert_eq!(store.inserted.lock().unwrap().len(), 99);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let store = Arc::new(FlakyStore {
            bad_id: 0,
            inserted: Mutex::new(Vec::new()),
        });
        let outcome = Inserter::new(store).insert_batch(&[]).await.unwrap();
        assert_eq!(outcome.inserted, 0);
        assert!(outcome.failures.is_empty());
    }

    /// Store double where everything fails as connection loss.
    struct DeadStore;

    #[async_trait]
    impl ClientStore for DeadStore {
        async fn insert_batch(&self, _records: &[ClientRecord]) -> Result<(), StoreError> {
            Err(StoreError::ConnectionLost("broken pipe".to_string()))
        }

        async fn insert_one(&self, _record: &ClientRecord) -> Result<(), StoreError> {
            Err(StoreError::ConnectionLost("broken pipe".to_string()))
        }

        async fn record_rejection(
            &self,
            _raw_line: &str,
            _reason: &str,
            _occurred_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            Err(StoreError::ConnectionLost("broken pipe".to_string()))
        }
    }

    #[tokio::test]
    async fn test_connection_loss_propagates() {
        let inserter = Inserter::new(Arc::new(DeadStore));
        let result = inserter.insert_batch(&[pending(1)]).await;
        assert!(matches!(result, Err(StoreError::ConnectionLost(_))));
    }
}
