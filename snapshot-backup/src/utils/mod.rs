//! Utility modules for snapshot backups.

pub mod errors;
pub mod format;
pub mod logger;

pub use errors::{AuditError, BackupError, FileError, Result};
