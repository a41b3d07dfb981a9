//! Error types for snapshot backups.
//!
//! `BackupError` is fatal to a run, `AuditError` is a broken audit trail
//! (also fatal), and `FileError` stays inside the per-file boundary of the
//! sync engine where it is downgraded to an `ERROR` decision.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Setup failures. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Source directory '{}' does not exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Destination directory '{}' does not exist", .0.display())]
    DestinationNotFound(PathBuf),

    #[error("Error creating directory {}: {source}", path.display())]
    SnapshotCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error creating or writing to log file at {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure to persist an audit record.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("failed to write to {sink} sink: {source}")]
    Write {
        sink: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("audit log is already closed")]
    Closed,
}

/// Per-file failure during comparison or copy.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Walk(#[from] walkdir::Error),
}

impl FileError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        FileError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
