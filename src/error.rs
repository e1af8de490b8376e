use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unified error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Version format error: {0}")]
    Format(String),

    #[error("Invalid change type: '{0}' (expected major, minor or patch)")]
    InvalidChangeType(String),

    #[error("Lock error on {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Data error in {}: {message}", .path.display())]
    Data { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results in pkg-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a version format error with context
    pub fn format(msg: impl Into<String>) -> Self {
        ReleaseError::Format(msg.into())
    }

    /// Create an invalid change type error for the rejected input
    pub fn invalid_change_type(kind: impl Into<String>) -> Self {
        ReleaseError::InvalidChangeType(kind.into())
    }

    /// Create a lock error for the given lock file
    pub fn lock(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ReleaseError::Lock {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an I/O error for the given path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ReleaseError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a data error for content that failed to parse
    pub fn data(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        ReleaseError::Data {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Whether the error wraps an I/O failure of the given kind
    pub fn is_io_kind(&self, kind: std::io::ErrorKind) -> bool {
        match self {
            ReleaseError::Io { source, .. } | ReleaseError::Lock { source, .. } => {
                source.kind() == kind
            }
            _ => false,
        }
    }
}
