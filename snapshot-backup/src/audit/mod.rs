//! Audit logger - the durable record of every decision in a run.
//!
//! A run's log moves through three states and never skips one:
//! `Init` (header written) -> `Logging` (per-file records) -> `Closed`
//! (footer written, sinks flushed). Every line goes to every sink, in order.
//! A failing required sink (the log file) is fatal; a failing optional sink
//! (the console) is detached with a warning.

pub mod sink;

pub use sink::{AuditSink, ConsoleSink, FileSink, MemorySink};

use crate::executor::{Decision, FileEvent, RunSummary, SyncMode};
use crate::utils::format::{format_bytes, format_duration};
use crate::utils::AuditError;
use chrono::{DateTime, Local};
use std::io;
use std::path::PathBuf;
use tracing::warn;

const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    Init,
    Logging,
    Closed,
}

/// What the header describes
#[derive(Debug, Clone)]
pub struct RunHeader {
    pub started_at: DateTime<Local>,
    pub mode: SyncMode,
    pub source: PathBuf,
    pub destination: PathBuf,
}

pub struct AuditLogger {
    sinks: Vec<Box<dyn AuditSink>>,
    state: AuditState,
    records: usize,
}

impl AuditLogger {
    /// Write the header to every sink and enter `Init`
    pub fn open(sinks: Vec<Box<dyn AuditSink>>, header: &RunHeader) -> Result<Self, AuditError> {
        let mut logger = Self {
            sinks,
            state: AuditState::Init,
            records: 0,
        };

        logger.emit(&format!(
            "Backup Log - Started: {}",
            header.started_at.format(LOG_TIME_FORMAT)
        ))?;
        logger.emit(&format!("Backup Type: {}", header.mode.label()))?;
        logger.emit(&format!("Source: {}", header.source.display()))?;
        logger.emit(&format!("Destination: {}", header.destination.display()))?;
        logger.emit("")?;

        Ok(logger)
    }

    pub fn state(&self) -> AuditState {
        self.state
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Append one per-file record
    pub fn record(&mut self, event: &FileEvent) -> Result<(), AuditError> {
        if self.state == AuditState::Closed {
            return Err(AuditError::Closed);
        }

        self.emit(&format_record(event))?;
        self.advance(AuditState::Logging);
        self.records += 1;
        Ok(())
    }

    /// Write the footer, flush every sink and enter `Closed`
    pub fn close(&mut self, summary: &RunSummary, finished_at: DateTime<Local>) -> Result<(), AuditError> {
        if self.state == AuditState::Closed {
            return Err(AuditError::Closed);
        }
        // A run with zero records still passes through Logging
        if self.state == AuditState::Init {
            self.advance(AuditState::Logging);
        }

        self.emit("")?;
        self.emit("--- Summary ---")?;
        self.emit(&format!("Total files in source: {}", summary.total_files))?;
        self.emit(&format!("Files copied: {}", summary.copied))?;
        self.emit(&format!("Files skipped: {}", summary.skipped))?;
        self.emit(&format!("Files with errors: {}", summary.errors))?;
        self.emit(&format!("Bytes copied: {}", format_bytes(summary.bytes_copied)))?;
        self.emit(&format!("Duration: {}", format_duration(summary.duration)))?;
        if summary.cancelled {
            self.emit("Backup cancelled before all files were processed")?;
        }
        self.emit(&format!(
            "Backup completed: {}",
            finished_at.format(LOG_TIME_FORMAT)
        ))?;

        self.each_sink(|sink| sink.flush())?;

        self.advance(AuditState::Closed);
        Ok(())
    }

    fn advance(&mut self, next: AuditState) {
        debug_assert!(
            matches!(
                (self.state, next),
                (AuditState::Init, AuditState::Logging)
                    | (AuditState::Logging, AuditState::Logging)
                    | (AuditState::Logging, AuditState::Closed)
            ),
            "illegal audit transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    fn emit(&mut self, line: &str) -> Result<(), AuditError> {
        self.each_sink(|sink| sink.write_line(line))
    }

    /// Apply `op` to every sink in order, detaching optional sinks that fail
    fn each_sink<F>(&mut self, mut op: F) -> Result<(), AuditError>
    where
        F: FnMut(&mut Box<dyn AuditSink>) -> io::Result<()>,
    {
        let mut index = 0;
        while index < self.sinks.len() {
            let sink = &mut self.sinks[index];
            match op(&mut *sink) {
                Ok(()) => index += 1,
                Err(e) if !sink.is_required() => {
                    warn!("Detaching {} sink after write failure: {}", sink.name(), e);
                    self.sinks.remove(index);
                }
                Err(source) => {
                    return Err(AuditError::Write {
                        sink: sink.name(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}

/// One audit line for a decision
pub fn format_record(event: &FileEvent) -> String {
    match (event.decision, &event.error) {
        (Decision::Error, Some(detail)) => format!(
            "{} {}: {}",
            Decision::Error.label(),
            event.source.display(),
            detail
        ),
        (Decision::Error, None) => format!("{} {}", Decision::Error.label(), event.source.display()),
        (decision, _) => format!("{}: {}", decision.label(), event.source.display()),
    }
}
