/// Error types for keyscan.
///
/// Only configuration and output errors are fatal to a run. Everything that can go
/// wrong with an individual file is recovered inside the worker that owns it and
/// either skips the file or becomes a diagnostic record, so these variants mostly
/// travel between the scanner and the engine rather than out to the caller.
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while configuring or running a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to write report to {path}: {source}")]
    OutputError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to start worker pool: {0}")]
    PoolError(#[from] rayon::ThreadPoolBuildError),
    #[error("Settings error: {0}")]
    SettingsError(#[from] config::ConfigError),
}

impl ScanError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound(path.into())
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile(path.into())
    }

    pub fn output_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputError {
            path: path.into(),
            source,
        }
    }

    /// Maps an I/O error on `path` to the most specific variant
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }

    /// True for errors raised before any scanning starts
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::DirectoryNotFound(_)
                | Self::NotADirectory(_)
                | Self::SettingsError(_)
        )
    }
}
