//! Per-file decisions and the events that carry them.

use std::path::PathBuf;

/// Outcome of classifying one source file against the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Nothing at the destination yet
    CopyNew,
    /// Full mode, content differs
    CopyModified,
    /// Incremental mode, source strictly newer
    CopyNewer,
    /// Full mode, content identical
    SkipIdentical,
    /// Incremental mode, source not newer
    SkipUpToDate,
    /// Comparison or copy failed; the file was skipped
    Error,
}

impl Decision {
    pub fn is_copy(self) -> bool {
        matches!(
            self,
            Decision::CopyNew | Decision::CopyModified | Decision::CopyNewer
        )
    }

    pub fn is_skip(self) -> bool {
        matches!(self, Decision::SkipIdentical | Decision::SkipUpToDate)
    }

    /// Prefix used in audit records
    pub fn label(self) -> &'static str {
        match self {
            Decision::CopyNew => "COPYING (New)",
            Decision::CopyModified => "COPYING (Full Backup - Modified)",
            Decision::CopyNewer => "COPYING (Incremental - Newer)",
            Decision::SkipIdentical => "SKIPPED (Identical)",
            Decision::SkipUpToDate => "SKIPPED (Incremental - Already up-to-date)",
            Decision::Error => "ERROR backing up",
        }
    }
}

/// One decision, emitted exactly once per discovered file
#[derive(Debug, Clone)]
pub struct FileEvent {
    /// Path of the file in the source tree
    pub source: PathBuf,

    /// Path relative to the source root (and to the snapshot root)
    pub relative_path: PathBuf,

    pub decision: Decision,

    /// Bytes written for COPY_* decisions
    pub bytes: u64,

    /// Failure detail for `Decision::Error`
    pub error: Option<String>,
}

impl FileEvent {
    pub fn completed(source: PathBuf, relative_path: PathBuf, decision: Decision, bytes: u64) -> Self {
        Self {
            source,
            relative_path,
            decision,
            bytes,
            error: None,
        }
    }

    pub fn failed(source: PathBuf, relative_path: PathBuf, error: impl ToString) -> Self {
        Self {
            source,
            relative_path,
            decision: Decision::Error,
            bytes: 0,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_partition() {
        let all = [
            Decision::CopyNew,
            Decision::CopyModified,
            Decision::CopyNewer,
            Decision::SkipIdentical,
            Decision::SkipUpToDate,
            Decision::Error,
        ];

        for decision in all {
            let buckets = [
                decision.is_copy(),
                decision.is_skip(),
                decision == Decision::Error,
            ];
            assert_eq!(buckets.iter().filter(|b| **b).count(), 1, "{:?}", decision);
        }
    }

    #[test]
    fn test_failed_event_carries_detail() {
        let event = FileEvent::failed("/src/a".into(), "a".into(), "Permission denied");
        assert_eq!(event.decision, Decision::Error);
        assert_eq!(event.error.as_deref(), Some("Permission denied"));
        assert_eq!(event.bytes, 0);
    }
}
