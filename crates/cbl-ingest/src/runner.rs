//! The import run
//!
//! Owns the streaming read loop and wires parser, batcher, inserter, and error
//! sink together. Strictly sequential, one pass: at any moment only the current
//! line and the current batch are in memory.
//!
//! A run moves from Idle to Running when the input opens, and ends Completed
//! (stream exhausted, final batch flushed) or Failed (input unreadable, or the
//! storage connection gone). Per-line problems never fail a run.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use cbl_common::ImportError;

use crate::batch::{BatchAccumulator, PendingRecord, DEFAULT_BATCH_SIZE};
use crate::insert::Inserter;
use crate::parser::{parse_line, NamePolicy};
use crate::progress::{resident_memory_mib, ProgressReporter};
use crate::record::RejectReason;
use crate::sink::ErrorSink;
use crate::store::{ClientStore, StoreError};

/// Lines between progress reports
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Settings for one import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub input_path: PathBuf,
    pub batch_size: usize,
    /// Lines between progress reports; 0 disables them
    pub progress_interval: u64,
    pub name_policy: NamePolicy,
}

impl ImportConfig {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            name_policy: NamePolicy::default(),
        }
    }
}

/// Counters and timings for a finished (or aborted) run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_lines: u64,
    pub valid: u64,
    pub invalid: u64,
    pub elapsed: Duration,
    pub memory_mib: Option<f64>,
    /// False when the run aborted before the stream was exhausted
    pub complete: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Import {}: {} lines ({} valid, {} invalid) in {:.2}s",
            if self.complete { "complete" } else { "incomplete" },
            self.total_lines,
            self.valid,
            self.invalid,
            self.elapsed.as_secs_f64(),
        )?;
        if let Some(mib) = self.memory_mib {
            write!(f, ", {:.2} MiB resident", mib)?;
        }
        Ok(())
    }
}

/// Mutable state threaded through one run; no ambient globals
struct RunContext<'a> {
    total_lines: u64,
    valid: u64,
    invalid: u64,
    sink: ErrorSink,
    reporter: &'a dyn ProgressReporter,
    started: Instant,
}

impl RunContext<'_> {
    async fn reject(&mut self, raw_line: &str, reason: &RejectReason) {
        self.invalid += 1;
        self.sink.record(raw_line, reason).await;
    }

    fn emit_progress(&self) {
        let mut message = format!(
            "Processed {} lines ({} valid, {} invalid)",
            self.total_lines, self.valid, self.invalid
        );
        if let Some(mib) = resident_memory_mib() {
            message.push_str(&format!(", {:.2} MiB resident", mib));
        }
        self.reporter.emit(&message);
    }

    fn summary(&self, complete: bool) -> RunSummary {
        RunSummary {
            total_lines: self.total_lines,
            valid: self.valid,
            invalid: self.invalid,
            elapsed: self.started.elapsed(),
            memory_mib: resident_memory_mib(),
            complete,
        }
    }
}

/// Run one full import pass over the input file
///
/// Returns the summary of a completed run. Per-line rejections are counted and
/// recorded, never returned as errors. Errors are fatal conditions only: the
/// input not opening (nothing is recorded in that case), the stream failing
/// mid-read, or the storage connection becoming unusable (committed batches
/// stay committed). Every fatal abort after the open emits the partial summary
/// through the reporter before returning.
pub async fn run_import(
    config: &ImportConfig,
    store: Arc<dyn ClientStore>,
    reporter: &dyn ProgressReporter,
) -> Result<RunSummary, ImportError> {
    let file = File::open(&config.input_path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ImportError::SourceNotFound(config.input_path.display().to_string())
        } else {
            ImportError::Io(err)
        }
    })?;

    info!(
        path = %config.input_path.display(),
        batch_size = config.batch_size,
        "Starting import run"
    );

    let inserter = Inserter::new(Arc::clone(&store));
    let mut ctx = RunContext {
        total_lines: 0,
        valid: 0,
        invalid: 0,
        sink: ErrorSink::new(store),
        reporter,
        started: Instant::now(),
    };
    let mut batch = BatchAccumulator::new(config.batch_size);
    let mut lines = BufReader::new(file).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => return Err(abort(&ctx, ImportError::Io(err))),
        };
        ctx.total_lines += 1;

        match parse_line(&line, config.name_policy) {
            Ok(record) => {
                batch.push(PendingRecord {
                    record,
                    raw_line: line,
                });
                if batch.is_full() {
                    if let Err(err) = flush(&inserter, &mut batch, &mut ctx).await {
                        return Err(abort(&ctx, err.into()));
                    }
                }
            },
            Err(reason) => {
                debug!(line = ctx.total_lines, reason = %reason, "Line rejected");
                ctx.reject(&line, &reason).await;
            },
        }

        if config.progress_interval > 0 && ctx.total_lines % config.progress_interval == 0 {
            ctx.emit_progress();
        }
    }

    // Final partial batch.
    if let Err(err) = flush(&inserter, &mut batch, &mut ctx).await {
        return Err(abort(&ctx, err.into()));
    }

    let summary = ctx.summary(true);
    ctx.reporter.emit(&summary.to_string());
    Ok(summary)
}

/// Drain and insert the current batch, attributing every record to a counter
async fn flush(
    inserter: &Inserter,
    batch: &mut BatchAccumulator,
    ctx: &mut RunContext<'_>,
) -> Result<(), StoreError> {
    if batch.is_empty() {
        return Ok(());
    }

    let pending = batch.drain();
    let outcome = inserter.insert_batch(&pending).await?;

    ctx.valid += outcome.inserted as u64;
    for (raw_line, reason) in &outcome.failures {
        ctx.reject(raw_line, reason).await;
    }
    Ok(())
}

/// Emit the partial summary before surfacing a fatal error
///
/// Lines of a batch that was in flight stay unattributed: the counters
/// report only what was observed to land somewhere.
fn abort(ctx: &RunContext<'_>, err: ImportError) -> ImportError {
    let summary = ctx.summary(false);
    ctx.reporter.emit(&summary.to_string());
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ImportConfig::new("input.dat");
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(config.name_policy, NamePolicy::Lenient);
    }

    #[test]
    fn test_summary_display_complete() {
        let summary = RunSummary {
            total_lines: 10,
            valid: 8,
            invalid: 2,
            elapsed: Duration::from_millis(1500),
            memory_mib: None,
            complete: true,
        };
        assert_eq!(
            summary.to_string(),
            "Import complete: 10 lines (8 valid, 2 invalid) in 1.50s"
        );
    }

    #[test]
    fn test_summary_display_incomplete_with_memory() {
        let summary = RunSummary {
            total_lines: 5,
            valid: 0,
            invalid: 1,
            elapsed: Duration::from_secs(2),
            memory_mib: Some(12.5),
            complete: false,
        };
        let rendered = summary.to_string();
        assert!(rendered.starts_with("Import incomplete: 5 lines"));
        assert!(rendered.ends_with("12.50 MiB resident"));
    }
}
