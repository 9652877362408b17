//! Runtime configuration for storage and logging.
//!
//! # Responsibility
//! - Resolve the database path and logging settings from the environment.
//! - Apply logging settings through `crate::logging`.
//!
//! # Invariants
//! - Blank environment values count as unset.
//! - Logging stays off unless a log directory is configured.

use crate::logging::{init_logging, LogLevel};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "KANBAN_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "KANBAN_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "KANBAN_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "kanban.db";

/// Storage and logging settings for one application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: LogLevel::default().to_string(),
            log_dir: None,
        }
    }
}

impl StorageConfig {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: value(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            log_level: value(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: value(LOG_DIR_ENV).map(PathBuf::from),
        }
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when logging is not configured.
    pub fn init_logging(&self) -> Result<bool, String> {
        match &self.log_dir {
            Some(log_dir) => init_logging(&self.log_level, log_dir).map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StorageConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_temp_dir_without_logging() {
        let config = StorageConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.db_path, std::env::temp_dir().join("kanban.db"));
        assert!(config.log_dir.is_none());
        assert!(!config.log_level.is_empty());
        assert_eq!(config.init_logging(), Ok(false));
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = StorageConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, " /var/lib/kanban/board.db "),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/kanban"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/var/lib/kanban/board.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/kanban")));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = StorageConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, "   "),
            (LOG_DIR_ENV, ""),
        ]));
        assert_eq!(config, StorageConfig::default());
    }
}
