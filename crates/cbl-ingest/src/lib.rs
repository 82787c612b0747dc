//! CBL Ingest Library
//!
//! Streaming loader for pipe-delimited customer flat files. Reads one line at a
//! time, validates it into a [`record::ClientRecord`] or a typed rejection,
//! groups valid records into batches, bulk-inserts them into PostgreSQL, and
//! writes every rejected line to an error table with its reason. Memory use is
//! bounded by one line plus one batch regardless of file size.
//!
//! # Example
//!
//! ```no_run
//! use cbl_ingest::progress::LogReporter;
//! use cbl_ingest::runner::{run_import, ImportConfig};
//! use cbl_ingest::store::PgClientStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cbl_common::Result<()> {
//!     let db_config = cbl_ingest::db::DbConfig::from_env()?;
//!     let pool = cbl_ingest::db::create_pool(&db_config).await?;
//!     let store = Arc::new(PgClientStore::new(pool));
//!
//!     let config = ImportConfig::new("./input/CLIENTES_IN_0425.dat");
//!     let summary = run_import(&config, store, &LogReporter).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod db;
pub mod insert;
pub mod parser;
pub mod progress;
pub mod record;
pub mod runner;
pub mod sink;
pub mod store;

// Re-export commonly used types
pub use record::{ClientRecord, RejectReason};
pub use runner::{run_import, ImportConfig, RunSummary};
