//! Configuration management for snapshot backups.
//!
//! Loads an optional TOML file; command-line flags are layered on top by the binary.

use crate::utils::{BackupError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// File or directory names containing any of these are skipped
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Follow symbolic links to directories
    #[serde(default)]
    pub follow_links: bool,

    /// Copy into a temp file and rename it over the target
    #[serde(default = "default_atomic_writes")]
    pub atomic_writes: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_atomic_writes() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            follow_links: false,
            atomic_writes: default_atomic_writes(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BackupError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| BackupError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert!(config.sync.exclude_patterns.is_empty());
        assert!(!config.sync.follow_links);
        assert!(config.sync.atomic_writes);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [sync]
            exclude_patterns = [".git", "node_modules"]
            atomic_writes = false
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.exclude_patterns, vec![".git", "node_modules"]);
        assert!(!config.sync.atomic_writes);
        assert!(!config.sync.follow_links);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_from_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[log]\nlevel = \"debug\"")?;

        let config = Config::from_file(file.path())?;
        assert_eq!(config.log.level, "debug");
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_config_error() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[sync]\nfollow_links = \"sometimes\"")?;

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(BackupError::Config(_))));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = Config::from_file(Path::new("/nonexistent/backup.toml"));
        assert!(matches!(result, Err(BackupError::Config(_))));
    }
}
