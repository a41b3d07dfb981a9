//! Snapshot Backup Library
//!
//! Mirrors a source directory into a fresh, timestamped snapshot directory,
//! deciding per file whether to copy or skip, and records every decision in
//! an audit log inside the snapshot.

pub mod audit;
pub mod config;
pub mod executor;
pub mod fs;
pub mod job;
pub mod shutdown;
pub mod snapshot;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use executor::{Decision, FileEvent, RunSummary, SyncEngine, SyncMode, SyncOptions};
pub use job::{run_backup, BackupReport, BackupRequest};
pub use utils::errors::{AuditError, BackupError, FileError};
pub type Result<T> = std::result::Result<T, BackupError>;
