//! Output targets for audit records.

use crate::utils::BackupError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A destination for audit lines.
pub trait AuditSink: Send {
    /// Short name used in error messages
    fn name(&self) -> &'static str;

    /// Whether a write failure must abort the run
    fn is_required(&self) -> bool {
        true
    }

    fn write_line(&mut self, line: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Mirrors records to standard output
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl AuditSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn is_required(&self) -> bool {
        false
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// The durable `backup.log` inside the snapshot.
///
/// Each line is flushed to the OS as it is written so a crash keeps every
/// record up to that point; `sync_all` runs once, on close.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create(path: &Path) -> Result<Self, BackupError> {
        let file = File::create(path).map_err(|source| BackupError::LogOpen {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl AuditSink for FileSink {
    fn name(&self) -> &'static str {
        "log file"
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }
}

/// Collects lines in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_writes_lines() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("backup.log");

        let mut sink = FileSink::create(&path)?;
        sink.write_line("first")?;
        sink.write_line("second")?;

        assert_eq!(std::fs::read_to_string(&path)?, "first\nsecond\n");
        Ok(())
    }

    #[test]
    fn test_file_sink_open_failure_is_log_open_error() {
        let result = FileSink::create(Path::new("/nonexistent-dir/backup.log"));
        assert!(matches!(result, Err(BackupError::LogOpen { .. })));
    }

    #[test]
    fn test_memory_sink_clones_share_buffer() -> io::Result<()> {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write_line("hello")?;

        assert_eq!(sink.lines(), vec!["hello"]);
        Ok(())
    }
}
