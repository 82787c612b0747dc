//! Error types for CBL
//!
//! Only fatal conditions live here. Per-line rejections are not errors in this
//! sense: they are captured as data (`RejectedLine`) and the run continues.

use thiserror::Error;

/// Result type alias for CBL operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Fatal errors that abort an import run
#[derive(Error, Debug)]
pub enum ImportError {
    /// Input file does not exist or could not be opened
    #[error("Input file not found: '{0}'. Verify the path exists and is readable.")]
    SourceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or .env file.")]
    Config(String),

    /// The storage connection became unusable mid-run
    #[error("Storage connection lost: {0}. Committed batches stay committed; re-run the file to load the remainder.")]
    ConnectionLost(String),

    /// Database failure outside per-record handling (e.g. running migrations)
    #[error("Database error: {0}")]
    Database(String),
}

impl ImportError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
