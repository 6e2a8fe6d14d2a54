/// This module defines the error types for keyscout, and the split between errors that
/// end a run and errors that only cost one file.
///
/// # Rust vs .NET Error Handling
///
/// A .NET worker loop typically swallows per-item exceptions:
/// ```csharp
/// foreach (var path in files) {
///     try {
///         Count(path, keywords);
///     } catch (IOException ex) {
///         Console.WriteLine($"skipping {path}: {ex.Message}");
///     }
/// }
/// ```
///
/// In Rust every scan returns a Result, and the worker decides what to do with it:
/// ```rust,ignore
/// match scanner.scan(path, &keywords) {
///     Ok(hits) => partial.record(&hits),
///     Err(e) => warn!("Skipping {}: {}", path.display(), e),
/// }
/// ```
///
/// # Fatal vs Recoverable
///
/// 1. **Configuration errors** (`NoInputFiles`, `NoKeywords`, `InvalidKeyword`,
///    `ConfigError`) are returned before any worker starts.
/// 2. **File access errors** (`FileNotFound`, `PermissionDenied`, `NotAFile`, `IoError`)
///    are produced per file and never leave the worker that hit them.
/// 3. **Worker failures** describe a panic caught at a worker boundary. They are logged
///    and counted, never propagated to the caller.
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for scan operations
pub type ScanOutcome<T> = Result<T, ScanError>;

/// Errors that can occur while scanning
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Worker {worker} failed: {reason}")]
    WorkerFailure { worker: usize, reason: String },
    #[error("No input files to scan")]
    NoInputFiles,
    #[error("No keywords to search for")]
    NoKeywords,
    #[error("Invalid keyword: {0:?}")]
    InvalidKeyword(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ScanError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile(path.into())
    }

    pub fn worker_failure(worker: usize, reason: impl Into<String>) -> Self {
        Self::WorkerFailure {
            worker,
            reason: reason.into(),
        }
    }

    pub fn invalid_keyword(keyword: impl Into<String>) -> Self {
        Self::InvalidKeyword(keyword.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an I/O error on `path` to the matching file access variant
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }

    /// True for errors that only affect a single file
    pub fn is_file_access(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::PermissionDenied(_) | Self::NotAFile(_) | Self::IoError(_)
        )
    }
}

impl From<config::ConfigError> for ScanError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
