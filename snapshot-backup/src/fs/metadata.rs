//! File metadata carried from source to snapshot.
//!
//! Content is copied first, then timestamps, then permission bits, so a
//! read-only source does not block the timestamp update on the copy.

use std::fs::{self, File, FileTimes};
use std::path::Path;
use std::time::SystemTime;

/// Metadata preserved on every copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,

    /// Last modified time, at whatever resolution the filesystem exposes
    pub modified: SystemTime,

    /// Last access time, if the platform reports one
    pub accessed: Option<SystemTime>,

    /// File permissions (Unix mode bits)
    pub permissions: Option<u32>,
}

impl FileMetadata {
    /// Extract metadata from a file path, following symlinks
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Self::from_metadata(&metadata)
    }

    pub fn from_metadata(metadata: &fs::Metadata) -> std::io::Result<Self> {
        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode())
        };

        #[cfg(not(unix))]
        let permissions = None;

        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified()?,
            accessed: metadata.accessed().ok(),
            permissions,
        })
    }

    /// Strictly newer than `other`. Equal timestamps are not newer.
    pub fn is_newer_than(&self, other: &FileMetadata) -> bool {
        self.modified > other.modified
    }

    /// Apply access and modification times through an open handle
    pub fn apply_times(&self, file: &File) -> std::io::Result<()> {
        let mut times = FileTimes::new().set_modified(self.modified);
        if let Some(accessed) = self.accessed {
            times = times.set_accessed(accessed);
        }
        file.set_times(times)
    }

    /// Apply permission bits to a path
    #[cfg(unix)]
    pub fn apply_permissions(&self, path: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        if let Some(mode) = self.permissions {
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    pub fn apply_permissions(&self, _path: &Path) -> std::io::Result<()> {
        // Mode bits are not captured on non-Unix platforms
        Ok(())
    }
}
