//! Error ledger
//!
//! Best-effort persistence of rejected lines. A failure to record a rejection
//! is logged and swallowed: the run is already tolerating bad lines, and the
//! ledger losing one entry must not cascade into losing the whole run.

use std::sync::Arc;

use tracing::warn;

use crate::record::{RejectReason, RejectedLine};
use crate::store::ClientStore;

/// Writes rejected lines to the error table
pub struct ErrorSink {
    store: Arc<dyn ClientStore>,
}

impl ErrorSink {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    /// Record one rejected line; never fails from the caller's view
    pub async fn record(&self, raw_line: &str, reason: &RejectReason) {
        let entry = RejectedLine::new(raw_line, reason);
        if let Err(err) = self
            .store
            .record_rejection(&entry.raw_line, &entry.reason, entry.occurred_at)
            .await
        {
            warn!(
                error = %err,
                reason = %entry.reason,
                line = %entry.raw_line,
                "Could not record rejected line in the error table"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::ClientRecord;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    struct LedgerStore {
        rejections: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ClientStore for LedgerStore {
        async fn insert_batch(&self, _records: &[ClientRecord]) -> Result<(), StoreError> {
            Ok(())
        }

        async fn insert_one(&self, _record: &ClientRecord) -> Result<(), StoreError> {
            Ok(())
        }

        async fn record_rejection(
            &self,
            raw_line: &str,
            reason: &str,
            _occurred_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Database("ledger unavailable".to_string()));
            }
            self.rejections
                .lock()
                .unwrap()
                .push((raw_line.to_string(), reason.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_records_truncated_entry() {
        let store = Arc::new(LedgerStore {
            rejections: Mutex::new(Vec::new()),
            fail: false,
        });
        let sink = ErrorSink::new(store.clone());

        let long_line = "x".repeat(700);
        sink.record(&long_line, &RejectReason::InvalidName).await;

        let rejections = store.rejections.lock().unwrap();
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].0.chars().count(), 500);
        assert_eq!(rejections[0].1, RejectReason::InvalidName.to_string());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = Arc::new(LedgerStore {
            rejections: Mutex::new(Vec::new()),
            fail: true,
        });
        let sink = ErrorSink::new(store);
        // Must not panic or propagate.
        sink.record("some|line", &RejectReason::InvalidName).await;
    }
}
