// Centralized error handling module
// Context-rich error types for hashing and store operations

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type for hashkeep
/// Carries the offending path and operation alongside the source error
#[derive(Debug)]
pub enum HashkeepError {
    /// File system errors with context
    FileNotFound { path: PathBuf },
    PermissionDenied { path: PathBuf, operation: String },
    IoError { path: Option<PathBuf>, operation: String, source: io::Error },

    /// Store persistence errors
    StoreWriteError { path: PathBuf, source: io::Error },
}

impl fmt::Display for HashkeepError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HashkeepError::FileNotFound { path } => {
                write!(f, "File not found: {}", path.display())
            }
            HashkeepError::PermissionDenied { path, operation } => {
                write!(f, "Permission denied while {} file: {}", operation, path.display())
            }
            HashkeepError::IoError { path, operation, source } => {
                if let Some(p) = path {
                    write!(f, "I/O error while {} file {}: {}", operation, p.display(), source)
                } else {
                    write!(f, "I/O error while {}: {}", operation, source)
                }
            }
            HashkeepError::StoreWriteError { path, source } => {
                write!(f, "Failed to write hash store {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for HashkeepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HashkeepError::IoError { source, .. } => Some(source),
            HashkeepError::StoreWriteError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl HashkeepError {
    /// Create an error with context about the operation and optional path
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(p)) => HashkeepError::FileNotFound { path: p },
            (io::ErrorKind::PermissionDenied, Some(p)) => HashkeepError::PermissionDenied {
                path: p,
                operation: operation.to_string(),
            },
            (_, path) => HashkeepError::IoError {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }
}

impl From<io::Error> for HashkeepError {
    fn from(err: io::Error) -> Self {
        HashkeepError::from_io_error(err, "unknown operation", None)
    }
}
