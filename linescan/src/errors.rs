use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while configuring or running a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("A search is already running")]
    AlreadyRunning,
    #[error("Failed to start worker pool: {0}")]
    PoolError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn pool_error(msg: impl Into<String>) -> Self {
        Self::PoolError(msg.into())
    }
}
