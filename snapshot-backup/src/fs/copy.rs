//! File transfer into the snapshot.
//!
//! Atomic mode writes a hidden temp file beside the target and renames it
//! into place, so an interrupted copy never leaves a truncated target.

use super::metadata::FileMetadata;
use crate::utils::FileError;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copy `source` to `target`, preserving timestamps and permission bits.
///
/// Returns the number of bytes written.
pub fn copy_with_metadata(source: &Path, target: &Path, atomic: bool) -> Result<u64, FileError> {
    let mut source_file =
        File::open(source).map_err(|e| FileError::io("opening", source, e))?;
    let metadata = source_file
        .metadata()
        .and_then(|m| FileMetadata::from_metadata(&m))
        .map_err(|e| FileError::io("reading metadata of", source, e))?;

    if !atomic {
        return write_target(&mut source_file, target, &metadata)
            .map_err(|e| FileError::io("copying to", target, e));
    }

    let temp_path = temp_path_for(target);
    // A stale temp file from a crashed run may be read-only
    let _ = fs::remove_file(&temp_path);

    let written = match write_target(&mut source_file, &temp_path, &metadata) {
        Ok(written) => written,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(FileError::io("copying to", target, e));
        }
    };

    if let Err(e) = fs::rename(&temp_path, target) {
        let _ = fs::remove_file(&temp_path);
        return Err(FileError::io("replacing", target, e));
    }

    if written != metadata.size {
        debug!(
            "Source changed during copy: {} ({} bytes expected, {} written)",
            source.display(),
            metadata.size,
            written
        );
    }

    Ok(written)
}

fn write_target(source: &mut File, path: &Path, metadata: &FileMetadata) -> io::Result<u64> {
    let mut output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    let written = io::copy(source, &mut output)?;
    metadata.apply_times(&output)?;
    drop(output);

    metadata.apply_permissions(path)?;
    Ok(written)
}

/// Temp file in the target's directory, so the rename stays on one filesystem
fn temp_path_for(target: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    target.with_file_name(temp_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_copy_new_file_preserves_mtime() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        fs::write(&source, b"hello snapshot")?;

        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        File::options().write(true).open(&source)?.set_modified(stamp)?;

        let written = copy_with_metadata(&source, &target, true)?;

        assert_eq!(written, 14);
        assert_eq!(fs::read(&target)?, b"hello snapshot");
        assert_eq!(fs::metadata(&target)?.modified()?, stamp);
        Ok(())
    }

    #[test]
    fn test_atomic_copy_overwrites_and_leaves_no_temp() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        fs::write(&source, b"new content")?;
        fs::write(&target, b"old")?;

        copy_with_metadata(&source, &target, true)?;

        assert_eq!(fs::read(&target)?, b"new content");
        assert!(!temp_path_for(&target).exists());
        Ok(())
    }

    #[test]
    fn test_in_place_copy() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("source.txt");
        let target = dir.path().join("target.txt");
        fs::write(&source, b"short")?;
        fs::write(&target, b"a much longer previous version")?;

        copy_with_metadata(&source, &target, false)?;

        assert_eq!(fs::read(&target)?, b"short");
        Ok(())
    }

    #[test]
    fn test_missing_source_is_file_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let result = copy_with_metadata(
            &dir.path().join("vanished.txt"),
            &dir.path().join("target.txt"),
            true,
        );

        assert!(matches!(result, Err(FileError::Io { op: "opening", .. })));
        assert!(!dir.path().join("target.txt").exists());
        Ok(())
    }

    #[test]
    fn test_failed_rename_keeps_previous_target() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let source = dir.path().join("source.txt");
        fs::write(&source, b"content")?;

        // A non-empty directory cannot be replaced by a file
        let target = dir.path().join("occupied");
        fs::create_dir(&target)?;
        fs::write(target.join("keep.txt"), b"keep")?;

        let result = copy_with_metadata(&source, &target, true);

        assert!(matches!(result, Err(FileError::Io { op: "replacing", .. })));
        assert_eq!(fs::read(target.join("keep.txt"))?, b"keep");
        assert!(!temp_path_for(&target).exists());
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_read_only_source_copies() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new()?;
        let source = dir.path().join("locked.txt");
        let target = dir.path().join("copy.txt");
        fs::write(&source, b"read only")?;
        fs::set_permissions(&source, fs::Permissions::from_mode(0o444))?;

        copy_with_metadata(&source, &target, true)?;

        let mode = fs::metadata(&target)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o444);
        assert_eq!(fs::read(&target)?, b"read only");
        Ok(())
    }
}
