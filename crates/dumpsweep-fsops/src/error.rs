//! # Design
//!
//! - Provide structured, constant-message errors for the sweep pipeline.
//! - Capture operation context (paths, keys) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use dumpsweep_notify::NotifyError;
use thiserror::Error;

use crate::model::ObjectKey;

/// Result type for sweep operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors that abort a sweep cycle.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the local filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Directory traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the traversal failure.
        operation: &'static str,
        /// Path involved in the traversal failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Object store failures while creating, writing, or committing an object.
    #[error("fsops object store failure")]
    Store {
        /// Operation that triggered the store failure.
        operation: &'static str,
        /// Object key being written.
        key: String,
        /// Underlying IO error reported by the store.
        source: io::Error,
    },
    /// Announcement failures other than rate limiting.
    #[error("fsops announcement failure")]
    Notify {
        /// Operation that triggered the notification failure.
        operation: &'static str,
        /// Object key that was being announced.
        key: String,
        /// Underlying notification error.
        source: NotifyError,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn store(operation: &'static str, key: &ObjectKey, source: io::Error) -> Self {
        Self::Store {
            operation,
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn notify(operation: &'static str, key: &ObjectKey, source: NotifyError) -> Self {
        Self::Notify {
            operation,
            key: key.to_string(),
            source,
        }
    }

    /// Operation label identifying the pipeline step that failed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Io { operation, .. }
            | Self::Walkdir { operation, .. }
            | Self::Store { operation, .. }
            | Self::Notify { operation, .. } => operation,
        }
    }
}
