//! Source tree traversal.
//!
//! Yields every directory (so the snapshot mirrors empty ones too), every
//! regular file, and every traversal failure, in the order walkdir produces
//! them. Entries are sorted by file name within a directory.

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Follow symbolic links
    pub follow_links: bool,

    /// Entries whose file name contains any of these are skipped
    pub exclude_patterns: Vec<String>,

    /// Paths that are never entered (e.g. a snapshot nested inside the source)
    pub prune: Vec<PathBuf>,
}

/// Information about a file discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file
    pub path: PathBuf,

    /// Relative path from the root
    pub relative_path: PathBuf,

    /// Is this a symlink to a regular file?
    pub is_symlink: bool,
}

/// One traversal event
#[derive(Debug)]
pub enum WalkItem {
    /// A directory to mirror. The root itself comes first with an empty relative path.
    Directory { path: PathBuf, relative_path: PathBuf },

    /// A regular file (or a symlink resolving to one)
    File(FileInfo),

    /// The walk could not read an entry
    Failed { path: PathBuf, error: walkdir::Error },
}

impl FileInfo {
    /// Create FileInfo from a DirEntry.
    /// Returns None for symlinks to directories, broken symlinks and special files.
    fn from_entry(entry: &DirEntry, root: &Path) -> Option<Self> {
        let path = entry.path().to_path_buf();
        let file_type = entry.file_type();

        let is_symlink = if file_type.is_file() {
            false
        } else if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(resolved) if resolved.is_file() => true,
                Ok(_) => {
                    debug!("Skipping symlink to non-file: {}", path.display());
                    return None;
                }
                Err(e) => {
                    debug!("Skipping broken symlink {}: {}", path.display(), e);
                    return None;
                }
            }
        } else {
            debug!("Skipping special file: {}", path.display());
            return None;
        };

        Some(Self {
            relative_path: relative_to(&path, root),
            path,
            is_symlink,
        })
    }
}

/// Walk a directory tree, handing every event to `callback`.
///
/// The walk stops early when the callback returns `ControlFlow::Break`.
pub fn walk_tree<F>(root: &Path, options: &WalkOptions, mut callback: F)
where
    F: FnMut(WalkItem) -> ControlFlow<()>,
{
    let entries = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !should_skip(entry, options));

    for entry in entries {
        let item = match entry {
            Ok(entry) if entry.file_type().is_dir() => WalkItem::Directory {
                relative_path: relative_to(entry.path(), root),
                path: entry.into_path(),
            },
            Ok(entry) => match FileInfo::from_entry(&entry, root) {
                Some(file) => WalkItem::File(file),
                None => continue,
            },
            Err(error) => WalkItem::Failed {
                path: error.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
                error,
            },
        };

        if callback(item).is_break() {
            break;
        }
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Check if a directory entry is excluded by name or pruned by path
fn should_skip(entry: &DirEntry, options: &WalkOptions) -> bool {
    if options.prune.iter().any(|p| p == entry.path()) {
        debug!("Pruning {}", entry.path().display());
        return true;
    }

    let file_name = entry.file_name().to_string_lossy();
    options
        .exclude_patterns
        .iter()
        .any(|pattern| file_name.contains(pattern.as_str()))
}
