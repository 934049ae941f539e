//! Error types for host fact collection

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`CollectError`]
pub type Result<T> = std::result::Result<T, CollectError>;

/// Why a single fact source could not be read
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound,
            io::ErrorKind::PermissionDenied => SourceError::PermissionDenied,
            _ => SourceError::ExecutionFailed(err.to_string()),
        }
    }
}

/// Hard failures of a check. Per-item failures never surface here.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("source unavailable: {source_ref}")]
    SourceUnavailable {
        source_ref: String,
        #[source]
        cause: SourceError,
    },

    #[error("home directory root unavailable: {}", path.display())]
    HomeRootUnavailable {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid id: {0}")]
    UnknownCheck(String),
}

impl CollectError {
    pub fn source_unavailable(source_ref: impl ToString, cause: SourceError) -> Self {
        CollectError::SourceUnavailable {
            source_ref: source_ref.to_string(),
            cause,
        }
    }

    /// Stable error code for logging
    pub fn code(&self) -> &'static str {
        match self {
            CollectError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            CollectError::HomeRootUnavailable { .. } => "HOME_ROOT_UNAVAILABLE",
            CollectError::Config(_) => "CONFIG_ERROR",
            CollectError::UnknownCheck(_) => "UNKNOWN_CHECK",
        }
    }
}
