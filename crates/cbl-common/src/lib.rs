//! CBL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error types and logging setup for the CBL (Client Bulk Loader)
//! workspace.
//!
//! # Example
//!
//! ```no_run
//! use cbl_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("loader starting");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{ImportError, Result};
