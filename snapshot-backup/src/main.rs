//! backup - mirror a directory into a timestamped snapshot.
//!
//! Every decision is printed as it happens and recorded in `backup.log`
//! inside the snapshot.

use anyhow::{bail, Result};
use clap::Parser;
use snapshot_backup::audit::ConsoleSink;
use snapshot_backup::shutdown::ShutdownCoordinator;
use snapshot_backup::snapshot::SystemClock;
use snapshot_backup::{config::Config, run_backup, utils, BackupRequest, SyncMode, SyncOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Back up a directory into a timestamped snapshot", long_about = None)]
struct Args {
    /// Source directory to back up
    source: PathBuf,

    /// Existing directory that receives the backup_<timestamp> snapshot
    destination: PathBuf,

    /// Compare existing files by content instead of modification time
    #[arg(long)]
    full: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip files and directories whose name contains PATTERN (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Follow symbolic links to directories
    #[arg(long)]
    follow_links: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    config.sync.exclude_patterns.extend(args.exclude);
    if args.follow_links {
        config.sync.follow_links = true;
    }

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let request = BackupRequest {
        source: args.source,
        destination: args.destination,
        options: SyncOptions::from_config(SyncMode::from_full_flag(args.full), &config.sync),
    };

    tracing::info!(
        "Starting backup v{}: {} -> {}",
        env!("CARGO_PKG_VERSION"),
        request.source.display(),
        request.destination.display()
    );

    let shutdown = Arc::new(ShutdownCoordinator::new());
    let cancel_token = shutdown.token();
    let listener = Arc::clone(&shutdown);
    let signal_handle = tokio::spawn(async move {
        listener.wait_for_signal().await;
    });

    // The sync itself is blocking filesystem work
    let result = tokio::task::spawn_blocking(move || {
        run_backup(&request, &SystemClock, cancel_token, vec![Box::new(ConsoleSink)])
    })
    .await?;

    signal_handle.abort();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Backup failed: {}", e);
            return Err(e.into());
        }
    };

    // stdout may already be closed (e.g. piped into `head`)
    let _ = writeln!(
        std::io::stdout(),
        "Backup log created at: {}",
        report.log_path.display()
    );

    if report.summary.cancelled {
        bail!(
            "Backup cancelled; snapshot {} is incomplete",
            report.snapshot.root.display()
        );
    }

    Ok(())
}
