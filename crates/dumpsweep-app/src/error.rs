//! # Design
//!
//! - Centralize application-level errors for bootstrap and scheduling.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Map every variant to a process exit code in one place.

use std::error::Error as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Exit code for configuration problems detected at startup.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for runtime failures.
pub const EXIT_FAILURE: i32 = 1;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Environment configuration was missing.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: &'static str,
    },
    /// Configuration validation failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: dumpsweep_config::ConfigError,
    },
    /// Notification client construction failed.
    #[error("notification client operation failed")]
    Notify {
        /// Operation identifier.
        operation: &'static str,
        /// Source notification error.
        source: dumpsweep_notify::NotifyError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: dumpsweep_telemetry::TelemetryError,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Optional path involved in the failure.
        path: Option<PathBuf>,
        /// Source IO error.
        source: io::Error,
    },
    /// A sweep cycle aborted under the exit failure policy.
    #[error("sweep cycle aborted")]
    CycleAborted {
        /// Pipeline step that failed.
        operation: &'static str,
        /// Source sweep error.
        source: dumpsweep_fsops::FsOpsError,
    },
    /// The blocking sweep task panicked or was cancelled.
    #[error("sweep task failed to complete")]
    Join {
        /// Source join error.
        source: tokio::task::JoinError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: dumpsweep_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn notify(
        operation: &'static str,
        source: dumpsweep_notify::NotifyError,
    ) -> Self {
        Self::Notify { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: dumpsweep_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn io(
        operation: &'static str,
        path: Option<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path,
            source,
        }
    }

    pub(crate) const fn cycle_aborted(source: dumpsweep_fsops::FsOpsError) -> Self {
        Self::CycleAborted {
            operation: source.operation(),
            source,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingEnv { .. } | Self::Config { .. } => EXIT_CONFIG,
            Self::Notify { .. }
            | Self::Telemetry { .. }
            | Self::Io { .. }
            | Self::CycleAborted { .. }
            | Self::Join { .. } => EXIT_FAILURE,
        }
    }

    /// Render the error, its context, and every source on one line.
    #[must_use]
    pub fn display_chain(&self) -> String {
        let mut message = match self {
            Self::MissingEnv { name } => format!("{self} ({name})"),
            Self::Config { operation, source } => {
                format!("{self} ({operation}, field {})", source.field())
            }
            Self::Notify { operation, .. }
            | Self::Telemetry { operation, .. }
            | Self::CycleAborted { operation, .. } => format!("{self} ({operation})"),
            Self::Io {
                operation,
                path: Some(path),
                ..
            } => format!("{self} ({operation}, {})", path.display()),
            Self::Io { operation, .. } => format!("{self} ({operation})"),
            Self::Join { .. } => self.to_string(),
        };
        let mut source = self.source();
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}
