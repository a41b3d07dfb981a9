//! Aggregate counters for one run.

use super::decision::FileEvent;
use std::time::Duration;

/// Totals for a run. Only ever incremented while the walk is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_files: usize,
    pub copied: usize,
    pub skipped: usize,
    pub errors: usize,
    pub bytes_copied: u64,

    /// The walk stopped at a file boundary because cancellation was requested
    pub cancelled: bool,

    pub duration: Duration,
}

impl RunSummary {
    pub fn record(&mut self, event: &FileEvent) {
        self.total_files += 1;
        if event.decision.is_copy() {
            self.copied += 1;
            self.bytes_copied += event.bytes;
        } else if event.decision.is_skip() {
            self.skipped += 1;
        } else {
            self.errors += 1;
        }
    }

    /// `copied + skipped + errors == total_files`
    pub fn is_balanced(&self) -> bool {
        self.copied + self.skipped + self.errors == self.total_files
    }
}
