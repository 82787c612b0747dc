//! Operator-visible progress reporting
//!
//! Advisory only: progress lines and the final summary go through
//! [`ProgressReporter`], and nothing in the pipeline depends on them arriving.

use tracing::info;

/// Sink for operator-visible progress and summary lines
///
/// Implementations must not fail from the pipeline's point of view; anything
/// that can go wrong while emitting is swallowed by the implementation.
pub trait ProgressReporter: Send + Sync {
    fn emit(&self, message: &str);
}

/// Reporter backed by the tracing pipeline
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn emit(&self, message: &str) {
        info!("{}", message);
    }
}

/// Resident set size of this process in MiB, if the platform exposes it
///
/// Reads `VmRSS` from `/proc/self/status`; returns `None` elsewhere. Advisory
/// only, used for progress lines and the run summary.
pub fn resident_memory_mib() -> Option<f64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss_kib(&status).map(|kib| kib as f64 / 1024.0)
}

fn parse_vm_rss_kib(status: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vm_rss_line() {
        let status = "Name:\tcbl-ingest\nVmPeak:\t  201000 kB\nVmRSS:\t   51200 kB\n";
        assert_eq!(parse_vm_rss_kib(status), Some(51200));
    }

    #[test]
    fn test_parse_vm_rss_missing() {
        assert_eq!(parse_vm_rss_kib("Name:\tcbl-ingest\n"), None);
        assert_eq!(parse_vm_rss_kib("VmRSS:\tgarbage kB\n"), None);
    }
}
