//! Telemetry errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Failures while installing logging or exporting sweep metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed.
    #[error("logging already initialised")]
    Logging {
        /// Underlying subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A sweep collector could not be built or registered.
    #[error("metrics collector rejected")]
    Collector {
        /// Collector name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The registry could not be rendered in text exposition format.
    #[error("metrics render failed")]
    Render {
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// Rendered exposition text was not UTF-8.
    #[error("metrics render produced invalid utf-8")]
    RenderUtf8 {
        /// Underlying conversion error.
        source: std::string::FromUtf8Error,
    },
    /// The textfile export could not be staged or swapped in.
    #[error("metrics textfile write failed")]
    Textfile {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}
