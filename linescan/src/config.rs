use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{ScanError, ScanResult};

/// Configuration for one search run.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file passed to `load_from`
/// 2. Local `.linescan.yaml` in the current directory
/// 3. Global `$HOME/.config/linescan/config.yaml`
///
/// # Configuration Format
///
/// The configuration uses YAML format. Example:
/// ```yaml
/// # File whose lines are searched
/// file_path: "words.txt"
///
/// # Case-insensitive substring to search for
/// query: "banana"
///
/// # Worker count (default: CPU cores)
/// worker_count: 4
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// CLI arguments take precedence over config file values; the merging
/// behavior is defined in the `merge_with_cli` method. A config is
/// immutable for the duration of a run: `Searcher::start` takes it by
/// value and validates it before any state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// File whose lines are searched
    #[serde(default)]
    pub file_path: PathBuf,

    /// Case-insensitive substring to search for
    #[serde(default)]
    pub query: String,

    /// Number of search workers to spawn
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_worker_count")]
    pub worker_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::new(),
            query: String::new(),
            worker_count: default_worker_count(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Creates a config for the given file and query with default
    /// worker count and log level.
    pub fn new(file_path: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            query: query.into(),
            ..Default::default()
        }
    }

    /// Rejects configurations that must never reach the pipeline: a
    /// missing file path or a blank query. Checked synchronously by
    /// `Searcher::start` before any state transition.
    pub fn validate(&self) -> ScanResult<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(ScanError::config_error("no input file selected"));
        }
        if self.query.trim().is_empty() {
            return Err(ScanError::config_error("search text must not be empty"));
        }
        Ok(())
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Default config locations
        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("linescan/config.yaml")),
            // Local config
            Some(PathBuf::from(".linescan.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        // Add existing config files
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // Build and deserialize
        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        // CLI values take precedence over config file values
        if !cli_config.file_path.as_os_str().is_empty() {
            self.file_path = cli_config.file_path;
        }
        if !cli_config.query.is_empty() {
            self.query = cli_config.query;
        }
        // Always use CLI worker count if specified
        self.worker_count = cli_config.worker_count;
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            file_path: "words.txt"
            query: "banana"
            worker_count: 4
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = SearchConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.file_path, PathBuf::from("words.txt"));
        assert_eq!(config.query, "banana");
        assert_eq!(config.worker_count, NonZeroUsize::new(4).unwrap());
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let config_content = r#"
            query: "banana"
        "#;

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = SearchConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.query, "banana");
        assert_eq!(config.file_path, PathBuf::new());
        assert_eq!(
            config.worker_count,
            NonZeroUsize::new(num_cpus::get()).unwrap()
        );
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_merge_with_cli() {
        let config_file = SearchConfig {
            file_path: PathBuf::from("words.txt"),
            query: "banana".to_string(),
            worker_count: NonZeroUsize::new(4).unwrap(),
            log_level: "warn".to_string(),
        };

        let cli_config = SearchConfig {
            file_path: PathBuf::from("other.txt"),
            query: String::new(),
            worker_count: NonZeroUsize::new(8).unwrap(),
            log_level: "debug".to_string(),
        };

        let merged = config_file.merge_with_cli(cli_config);
        assert_eq!(merged.file_path, PathBuf::from("other.txt")); // CLI value
        assert_eq!(merged.query, "banana"); // File value (CLI empty)
        assert_eq!(merged.worker_count, NonZeroUsize::new(8).unwrap()); // CLI value
        assert_eq!(merged.log_level, "debug"); // CLI value
    }

    #[test]
    fn test_validate_rejects_blank_query() {
        let config = SearchConfig::new("words.txt", "   ");
        assert!(matches!(
            config.validate(),
            Err(crate::errors::ScanError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let config = SearchConfig::new("", "banana");
        assert!(matches!(
            config.validate(),
            Err(crate::errors::ScanError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let config = SearchConfig::new("words.txt", "banana");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config_content = r#"
            query: 123  # Should be string
            worker_count: "invalid"  # Should be number
        "#;

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let result = SearchConfig::load_from(Some(&config_path));
        assert!(result.is_err(), "Expected error loading invalid config");
    }
}
