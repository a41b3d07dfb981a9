//! Sync engine - mirrors a source tree into a snapshot.
//!
//! Every regular file gets exactly one `Decision`:
//! - no destination file: copy (`CopyNew`)
//! - full mode: byte-exact comparison, copy only if content differs
//! - incremental mode: copy only if the source mtime is strictly newer
//!
//! Per-file failures become `Decision::Error` and the walk carries on.
//! Only a failing event consumer (the audit trail) stops the run.

pub mod decision;
pub mod summary;

pub use decision::{Decision, FileEvent};
pub use summary::RunSummary;

use crate::config::SyncConfig;
use crate::fs::compare::files_identical;
use crate::fs::copy::copy_with_metadata;
use crate::fs::metadata::FileMetadata;
use crate::fs::walker::{walk_tree, FileInfo, WalkItem, WalkOptions};
use crate::utils::{AuditError, FileError};
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How existing destination files are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Byte-exact content comparison
    Full,
    /// Modification time comparison
    Incremental,
}

impl SyncMode {
    pub fn from_full_flag(full: bool) -> Self {
        if full {
            SyncMode::Full
        } else {
            SyncMode::Incremental
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SyncMode::Full => "Full",
            SyncMode::Incremental => "Incremental",
        }
    }
}

/// Sync engine configuration
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mode: SyncMode,
    pub exclude_patterns: Vec<String>,
    pub follow_links: bool,
    pub atomic_writes: bool,
}

impl SyncOptions {
    pub fn new(mode: SyncMode) -> Self {
        Self::from_config(mode, &SyncConfig::default())
    }

    pub fn from_config(mode: SyncMode, config: &SyncConfig) -> Self {
        Self {
            mode,
            exclude_patterns: config.exclude_patterns.clone(),
            follow_links: config.follow_links,
            atomic_writes: config.atomic_writes,
        }
    }
}

/// Main sync engine
pub struct SyncEngine {
    options: SyncOptions,
    cancel_token: CancellationToken,
    /// Destination-relative paths the engine must never write
    reserved: Vec<PathBuf>,
    /// Paths the walk must never enter if they lie inside the source
    prune: Vec<PathBuf>,
}

impl SyncEngine {
    /// Create a new sync engine (no cancellation support)
    pub fn new(options: SyncOptions) -> Self {
        Self::with_cancel(options, CancellationToken::new())
    }

    /// Create a new sync engine that stops at the next file boundary once cancelled
    pub fn with_cancel(options: SyncOptions, cancel_token: CancellationToken) -> Self {
        Self {
            options,
            cancel_token,
            reserved: Vec::new(),
            prune: Vec::new(),
        }
    }

    /// Keep a destination-relative path (e.g. the audit log) out of reach.
    /// A source file mapping onto it gets an `Error` decision.
    pub fn with_reserved(mut self, relative_path: impl Into<PathBuf>) -> Self {
        self.reserved.push(relative_path.into());
        self
    }

    /// Never descend into `path` when it lies inside the source tree.
    /// The run's own destination is always pruned.
    pub fn with_prune(mut self, path: impl Into<PathBuf>) -> Self {
        self.prune.push(path.into());
        self
    }

    /// Mirror `source` into `destination`, handing every decision to `on_event`
    /// in walk order.
    pub fn run<F>(
        &self,
        source: &Path,
        destination: &Path,
        mut on_event: F,
    ) -> Result<RunSummary, AuditError>
    where
        F: FnMut(&FileEvent) -> Result<(), AuditError>,
    {
        let start_time = Instant::now();

        info!(
            "Starting {} sync: {} -> {}",
            self.options.mode.label(),
            source.display(),
            destination.display()
        );

        let walk_options = WalkOptions {
            follow_links: self.options.follow_links,
            exclude_patterns: self.options.exclude_patterns.clone(),
            prune: std::iter::once(destination)
                .chain(self.prune.iter().map(PathBuf::as_path))
                .filter_map(|candidate| nested_path(source, candidate))
                .collect(),
        };

        let mut summary = RunSummary::default();
        let mut audit_failure = None;

        walk_tree(source, &walk_options, |item| {
            if self.cancel_token.is_cancelled() {
                info!("Cancellation requested, stopping after {} files", summary.total_files);
                summary.cancelled = true;
                return ControlFlow::Break(());
            }

            let event = match item {
                WalkItem::Directory { path, relative_path } => {
                    mirror_directory(&path, &destination.join(&relative_path));
                    return ControlFlow::Continue(());
                }
                WalkItem::File(file) => self.sync_file(&file, destination),
                WalkItem::Failed { path, error } => {
                    warn!("Failed to read {}: {}", path.display(), error);
                    let relative_path = path.strip_prefix(source).unwrap_or(&path).to_path_buf();
                    FileEvent::failed(path, relative_path, FileError::from(error))
                }
            };

            summary.record(&event);

            match on_event(&event) {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    audit_failure = Some(e);
                    ControlFlow::Break(())
                }
            }
        });

        if let Some(e) = audit_failure {
            return Err(e);
        }

        summary.duration = start_time.elapsed();

        info!(
            "Sync finished: {} files, {} copied, {} skipped, {} errors in {:?}",
            summary.total_files, summary.copied, summary.skipped, summary.errors, summary.duration
        );

        Ok(summary)
    }

    /// Decide and act on one file. Never fails: errors become an `Error` event.
    fn sync_file(&self, file: &FileInfo, destination: &Path) -> FileEvent {
        if self.reserved.contains(&file.relative_path) {
            warn!("Refusing to overwrite reserved path: {}", file.relative_path.display());
            return FileEvent::failed(
                file.path.clone(),
                file.relative_path.clone(),
                "destination path is reserved for the backup log",
            );
        }

        let target = destination.join(&file.relative_path);

        match self.classify_and_apply(&file.path, &target) {
            Ok((decision, bytes)) => {
                debug!("{:?}: {}", decision, file.relative_path.display());
                FileEvent::completed(
                    file.path.clone(),
                    file.relative_path.clone(),
                    decision,
                    bytes,
                )
            }
            Err(e) => {
                warn!("Failed to back up {}: {}", file.path.display(), e);
                FileEvent::failed(file.path.clone(), file.relative_path.clone(), e)
            }
        }
    }

    fn classify_and_apply(&self, source: &Path, target: &Path) -> Result<(Decision, u64), FileError> {
        let atomic = self.options.atomic_writes;

        let target_metadata = match fs::metadata(target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let bytes = copy_with_metadata(source, target, atomic)?;
                return Ok((Decision::CopyNew, bytes));
            }
            Err(e) => return Err(FileError::io("inspecting", target, e)),
        };

        match self.options.mode {
            SyncMode::Full => {
                let identical = files_identical(source, target)
                    .map_err(|e| FileError::io("comparing", source, e))?;
                if identical {
                    Ok((Decision::SkipIdentical, 0))
                } else {
                    let bytes = copy_with_metadata(source, target, atomic)?;
                    Ok((Decision::CopyModified, bytes))
                }
            }
            SyncMode::Incremental => {
                let source_meta = FileMetadata::from_path(source)
                    .map_err(|e| FileError::io("reading metadata of", source, e))?;
                let target_meta = FileMetadata::from_metadata(&target_metadata)
                    .map_err(|e| FileError::io("reading metadata of", target, e))?;

                if source_meta.is_newer_than(&target_meta) {
                    let bytes = copy_with_metadata(source, target, atomic)?;
                    Ok((Decision::CopyNewer, bytes))
                } else {
                    Ok((Decision::SkipUpToDate, 0))
                }
            }
        }
    }
}

/// Create the mirror of a source directory. Failure is logged only; the
/// files inside will each fail with their own `Error` decision.
fn mirror_directory(source_dir: &Path, target_dir: &Path) {
    if let Err(e) = fs::create_dir_all(target_dir) {
        warn!(
            "Failed to create directory {} (mirroring {}): {}",
            target_dir.display(),
            source_dir.display(),
            e
        );
    }
}

/// If `candidate` lives inside `source`, the path the walk will reach it by.
fn nested_path(source: &Path, candidate: &Path) -> Option<PathBuf> {
    let source_canonical = source.canonicalize().ok()?;
    let candidate_canonical = candidate.canonicalize().ok()?;
    let relative = candidate_canonical.strip_prefix(&source_canonical).ok()?;

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(source.join(relative))
    }
}
