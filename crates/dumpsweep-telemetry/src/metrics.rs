//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - The daemon exposes no HTTP surface, so metrics are exported through the
//!   node-exporter textfile convention (write to a temp file, then rename).

use std::convert::TryFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::error::{TelemetryError, TelemetryResult};

/// Final state of a sweep cycle, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleResult {
    /// The walk visited every entry.
    Completed,
    /// The walk stopped at its first fatal error.
    Aborted,
}

impl CycleResult {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

/// Per-file outcome, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileResult {
    /// Uploaded, announced, and removed.
    Uploaded,
    /// Modified too recently to be eligible.
    SkippedTooNew,
    /// Not a regular file.
    SkippedIrregular,
}

impl FileResult {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::SkippedTooNew => "skipped_too_new",
            Self::SkippedIrregular => "skipped_irregular",
        }
    }
}

/// Prometheus-backed metrics registry shared across the sweep components.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    cycles_total: IntCounterVec,
    files_total: IntCounterVec,
    bytes_uploaded_total: IntCounter,
    notify_rate_limited_total: IntCounter,
    last_cycle_duration_ms: IntGauge,
}

/// Snapshot of selected counters for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Cycles that visited every entry.
    pub cycles_completed: u64,
    /// Cycles aborted by a fatal error.
    pub cycles_aborted: u64,
    /// Files uploaded, announced, and removed.
    pub files_uploaded: u64,
    /// Files skipped because they were too new.
    pub files_skipped_too_new: u64,
    /// Uncompressed bytes uploaded.
    pub bytes_uploaded: u64,
    /// Rate-limited notification responses observed.
    pub notify_rate_limited: u64,
    /// Duration of the most recent cycle in milliseconds.
    pub last_cycle_duration_ms: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let cycles_total = IntCounterVec::new(
            Opts::new("sweep_cycles_total", "Sweep cycles by final outcome"),
            &["outcome"],
        )
        .map_err(|source| register_error("sweep_cycles_total", source))?;
        let files_total = IntCounterVec::new(
            Opts::new("sweep_files_total", "Files visited by per-file result"),
            &["result"],
        )
        .map_err(|source| register_error("sweep_files_total", source))?;
        let bytes_uploaded_total = IntCounter::with_opts(Opts::new(
            "sweep_bytes_uploaded_total",
            "Uncompressed bytes transferred to the object store",
        ))
        .map_err(|source| register_error("sweep_bytes_uploaded_total", source))?;
        let notify_rate_limited_total = IntCounter::with_opts(Opts::new(
            "sweep_notify_rate_limited_total",
            "Announcements rejected with a rate-limit signal",
        ))
        .map_err(|source| register_error("sweep_notify_rate_limited_total", source))?;
        let last_cycle_duration_ms = IntGauge::with_opts(Opts::new(
            "sweep_last_cycle_duration_ms",
            "Wall-clock duration of the most recent sweep cycle (ms)",
        ))
        .map_err(|source| register_error("sweep_last_cycle_duration_ms", source))?;

        registry
            .register(Box::new(cycles_total.clone()))
            .map_err(|source| register_error("sweep_cycles_total", source))?;
        registry
            .register(Box::new(files_total.clone()))
            .map_err(|source| register_error("sweep_files_total", source))?;
        registry
            .register(Box::new(bytes_uploaded_total.clone()))
            .map_err(|source| register_error("sweep_bytes_uploaded_total", source))?;
        registry
            .register(Box::new(notify_rate_limited_total.clone()))
            .map_err(|source| register_error("sweep_notify_rate_limited_total", source))?;
        registry
            .register(Box::new(last_cycle_duration_ms.clone()))
            .map_err(|source| register_error("sweep_last_cycle_duration_ms", source))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                cycles_total,
                files_total,
                bytes_uploaded_total,
                notify_rate_limited_total,
                last_cycle_duration_ms,
            }),
        })
    }

    /// Record the end of a sweep cycle.
    pub fn observe_cycle(&self, result: CycleResult, duration: Duration) {
        self.inner
            .cycles_total
            .with_label_values(&[result.as_str()])
            .inc();
        self.inner
            .last_cycle_duration_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Count a visited file by its result.
    pub fn inc_file(&self, result: FileResult) {
        self.inner
            .files_total
            .with_label_values(&[result.as_str()])
            .inc();
    }

    /// Add to the uploaded byte counter.
    pub fn add_bytes_uploaded(&self, bytes: u64) {
        self.inner.bytes_uploaded_total.inc_by(bytes);
    }

    /// Add rate-limited notification responses.
    pub fn add_notify_rate_limited(&self, count: u64) {
        self.inner.notify_rate_limited_total.inc_by(count);
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Render { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::RenderUtf8 { source })
    }

    /// Write the rendered metrics to `path`, replacing any previous export atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written or renamed.
    pub fn write_textfile(&self, path: &Path) -> TelemetryResult<()> {
        let rendered = self.render()?;
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = Path::new(&staging);
        std::fs::write(staging, rendered.as_bytes()).map_err(|source| {
            TelemetryError::Textfile {
                path: staging.to_path_buf(),
                source,
            }
        })?;
        std::fs::rename(staging, path).map_err(|source| TelemetryError::Textfile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Take a point-in-time snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let cycles = |result: CycleResult| {
            self.inner
                .cycles_total
                .with_label_values(&[result.as_str()])
                .get()
        };
        let files = |result: FileResult| {
            self.inner
                .files_total
                .with_label_values(&[result.as_str()])
                .get()
        };
        MetricsSnapshot {
            cycles_completed: cycles(CycleResult::Completed),
            cycles_aborted: cycles(CycleResult::Aborted),
            files_uploaded: files(FileResult::Uploaded),
            files_skipped_too_new: files(FileResult::SkippedTooNew),
            bytes_uploaded: self.inner.bytes_uploaded_total.get(),
            notify_rate_limited: self.inner.notify_rate_limited_total.get(),
            last_cycle_duration_ms: self.inner.last_cycle_duration_ms.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

const fn register_error(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::Collector { name, source }
}
