//! Domain types for the import pipeline
//!
//! A line of input either becomes a fully validated [`ClientRecord`] or a
//! [`RejectReason`]; there is no partially valid state. Rejections destined for
//! the error table are wrapped in a [`RejectedLine`], which applies the storage
//! truncation limits exactly once at construction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Storage limits
// ============================================================================

/// Maximum characters stored for a full name; longer names are truncated, not
/// rejected.
pub const MAX_FULL_NAME_CHARS: usize = 100;

/// Maximum characters of raw input retained in the error table.
pub const MAX_RAW_LINE_CHARS: usize = 500;

/// Maximum characters of a rejection reason retained in the error table.
pub const MAX_REASON_CHARS: usize = 255;

/// A validated customer record ready for insertion
///
/// Only constructed by the parser after every required field has passed
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Given name and surname joined with a space, at most
    /// [`MAX_FULL_NAME_CHARS`] characters
    pub full_name: String,
    pub national_id: i64,
    pub status: String,
    pub admission_date: NaiveDate,
    pub is_politically_exposed: bool,
    /// `None` when the source field was empty or absent (unknown)
    pub is_obligated_subject: Option<bool>,
}

/// Why a line was rejected instead of inserted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Fewer than the five mandatory pipe-separated fields
    #[error("insufficient fields: expected at least 5, found {found}")]
    InsufficientFields { found: usize },

    /// One of the five mandatory fields is empty after trimming
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// The national id field is not a base-10 integer
    #[error("invalid national id: '{0}'")]
    InvalidId(String),

    /// The admission date field is not a valid YYYY-MM-DD date
    #[error("invalid admission date: '{0}'")]
    InvalidDate(String),

    /// Full name failed the strict policy (2-4 alphabetic words)
    #[error("invalid full name: expected 2 to 4 words of letters and spaces")]
    InvalidName,

    /// The store rejected an otherwise well-formed record
    #[error("insert failed: {0}")]
    Insert(String),
}

/// A rejected line as persisted to the error table
///
/// Truncation happens here so every path into the error table observes the
/// same limits. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub raw_line: String,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

impl RejectedLine {
    pub fn new(raw_line: &str, reason: &RejectReason) -> Self {
        Self {
            raw_line: truncate_chars(raw_line, MAX_RAW_LINE_CHARS).to_string(),
            reason: truncate_chars(&reason.to_string(), MAX_REASON_CHARS).to_string(),
            occurred_at: Utc::now(),
        }
    }
}

/// Truncate a string to at most `max` characters, respecting char boundaries
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
