//! Batch accumulation
//!
//! Groups validated records into fixed-size batches so the inserter can amortize
//! round trips. Pure grouping: no validation, no I/O.

use crate::record::ClientRecord;

/// Records per bulk insert statement. Bounded by PostgreSQL's bind parameter
/// limit (6 binds per row).
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A validated record together with the raw line it came from
///
/// The raw text rides along so a persistence failure can still be written to
/// the error table with the original line.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub record: ClientRecord,
    pub raw_line: String,
}

/// Fixed-capacity accumulator for validated records
#[derive(Debug)]
pub struct BatchAccumulator {
    pending: Vec<PendingRecord>,
    capacity: usize,
}

impl BatchAccumulator {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, pending: PendingRecord) {
        self.pending.push(pending);
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Take the current batch, leaving the accumulator empty
    pub fn drain(&mut self) -> Vec<PendingRecord> {
        std::mem::take(&mut self.pending)
    }
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
