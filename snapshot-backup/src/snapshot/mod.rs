//! Snapshot allocation.
//!
//! Each run gets a fresh `backup_YYYY-MM-DD_HH-MM-SS` directory under the
//! destination root. Runs within the same second get `_01`..`_99` suffixes,
//! which keeps lexicographic and allocation order identical.

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use crate::utils::{BackupError, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SNAPSHOT_PREFIX: &str = "backup_";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const MAX_COLLISION_SUFFIX: u32 = 99;

/// A freshly created, exclusively owned snapshot directory
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub root: PathBuf,
    pub name: String,
    pub created_at: DateTime<Local>,
}

/// Directory name for a snapshot taken at `timestamp`
pub fn snapshot_name(timestamp: &DateTime<Local>) -> String {
    format!("{}{}", SNAPSHOT_PREFIX, timestamp.format(TIMESTAMP_FORMAT))
}

/// Create a new snapshot directory under `destination_root`.
///
/// The root itself must already exist; it is never created here.
pub fn allocate(destination_root: &Path, clock: &dyn Clock) -> Result<Snapshot> {
    let created_at = clock.now();
    let base_name = snapshot_name(&created_at);

    for attempt in 0..=MAX_COLLISION_SUFFIX {
        let name = if attempt == 0 {
            base_name.clone()
        } else {
            format!("{}_{:02}", base_name, attempt)
        };
        let root = destination_root.join(&name);

        match fs::create_dir(&root) {
            Ok(()) => {
                info!("Created new backup folder: {}", root.display());
                return Ok(Snapshot {
                    root,
                    name,
                    created_at,
                });
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Snapshot name taken: {}", name);
            }
            Err(source) => return Err(BackupError::SnapshotCreate { path: root, source }),
        }
    }

    Err(BackupError::SnapshotCreate {
        path: destination_root.join(&base_name),
        source: io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("all {} collision suffixes are taken", MAX_COLLISION_SUFFIX),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_clock() -> FixedClock {
        FixedClock(Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap())
    }

    #[test]
    fn test_snapshot_name_format() {
        assert_eq!(snapshot_name(&fixed_clock().0), "backup_2024-03-05_14-07-09");
    }

    #[test]
    fn test_names_sort_chronologically() {
        let earlier = Local.with_ymd_and_hms(2024, 9, 30, 23, 59, 59).unwrap();
        let later = Local.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        assert!(snapshot_name(&earlier) < snapshot_name(&later));
    }

    #[test]
    fn test_allocate_creates_directory() -> anyhow::Result<()> {
        let dir = TempDir::new()?;

        let snapshot = allocate(dir.path(), &fixed_clock())?;

        assert!(snapshot.root.is_dir());
        assert_eq!(snapshot.name, "backup_2024-03-05_14-07-09");
        assert_eq!(snapshot.root, dir.path().join(&snapshot.name));
        Ok(())
    }

    #[test]
    fn test_same_second_collisions_get_suffixes() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let clock = fixed_clock();

        let first = allocate(dir.path(), &clock)?;
        let second = allocate(dir.path(), &clock)?;
        let third = allocate(dir.path(), &clock)?;

        assert_eq!(first.name, "backup_2024-03-05_14-07-09");
        assert_eq!(second.name, "backup_2024-03-05_14-07-09_01");
        assert_eq!(third.name, "backup_2024-03-05_14-07-09_02");
        assert!(first.name < second.name && second.name < third.name);

        let next_second = FixedClock(Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 10).unwrap());
        assert!(third.name < snapshot_name(&next_second.0));
        Ok(())
    }

    #[test]
    fn test_missing_destination_root_fails() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let result = allocate(&dir.path().join("missing"), &fixed_clock());

        assert!(matches!(result, Err(BackupError::SnapshotCreate { .. })));
        assert!(!dir.path().join("missing").exists());
        Ok(())
    }
}
