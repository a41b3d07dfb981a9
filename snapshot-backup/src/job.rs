//! One backup run: validate, allocate a snapshot, open the audit log,
//! mirror the source, close the log.

use crate::audit::{AuditLogger, AuditSink, FileSink, RunHeader};
use crate::executor::{RunSummary, SyncEngine, SyncOptions};
use crate::snapshot::{self, Clock, Snapshot, SNAPSHOT_PREFIX};
use crate::utils::{BackupError, Result};
use std::fs;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Name of the audit log at the snapshot root
pub const LOG_FILE_NAME: &str = "backup.log";

/// Backup job configuration
#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub options: SyncOptions,
}

/// Backup execution result
#[derive(Debug)]
pub struct BackupReport {
    pub snapshot: Snapshot,
    pub log_path: PathBuf,
    pub summary: RunSummary,
}

/// Check that source and destination exist and are directories
pub fn validate(request: &BackupRequest) -> Result<()> {
    if !request.source.is_dir() {
        return Err(BackupError::SourceNotFound(request.source.clone()));
    }
    if !request.destination.is_dir() {
        return Err(BackupError::DestinationNotFound(request.destination.clone()));
    }
    Ok(())
}

/// Directories the walk must skip so no snapshot is ever copied into another.
///
/// Normally that is the whole destination root. When the destination root is
/// the source itself, pruning it would skip everything, so the existing
/// snapshot directories are pruned instead.
fn snapshot_prune_paths(request: &BackupRequest) -> Vec<PathBuf> {
    let same_root = match (request.source.canonicalize(), request.destination.canonicalize()) {
        (Ok(source), Ok(destination)) => source == destination,
        _ => false,
    };
    if !same_root {
        return vec![request.destination.clone()];
    }

    match fs::read_dir(&request.destination) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(SNAPSHOT_PREFIX))
            .map(|entry| entry.path())
            .collect(),
        Err(e) => {
            warn!(
                "Could not list earlier snapshots in {}: {}",
                request.destination.display(),
                e
            );
            Vec::new()
        }
    }
}

/// Execute a backup.
///
/// `mirrors` receive every audit line alongside the snapshot's log file
/// (the binary passes a console sink). Per-file failures are counted in
/// the summary; only setup and audit failures are returned as errors.
pub fn run_backup(
    request: &BackupRequest,
    clock: &dyn Clock,
    cancel_token: CancellationToken,
    mirrors: Vec<Box<dyn AuditSink>>,
) -> Result<BackupReport> {
    validate(request)?;
    let prune = snapshot_prune_paths(request);

    let snapshot = snapshot::allocate(&request.destination, clock)?;
    let log_path = snapshot.root.join(LOG_FILE_NAME);

    let mut sinks: Vec<Box<dyn AuditSink>> = vec![Box::new(FileSink::create(&log_path)?)];
    sinks.extend(mirrors);

    let header = RunHeader {
        started_at: snapshot.created_at,
        mode: request.options.mode,
        source: request.source.clone(),
        destination: snapshot.root.clone(),
    };
    let mut audit = AuditLogger::open(sinks, &header)?;

    let engine = prune.into_iter().fold(
        SyncEngine::with_cancel(request.options.clone(), cancel_token).with_reserved(LOG_FILE_NAME),
        |engine, path| engine.with_prune(path),
    );

    let summary = engine
        .run(&request.source, &snapshot.root, |event| audit.record(event))
        .map_err(|e| {
            error!("Audit trail failed, aborting backup: {}", e);
            e
        })?;

    audit.close(&summary, clock.now())?;

    info!(
        "Backup {} complete: {} copied, {} skipped, {} errors",
        snapshot.name, summary.copied, summary.skipped, summary.errors
    );

    Ok(BackupReport {
        snapshot,
        log_path,
        summary,
    })
}
