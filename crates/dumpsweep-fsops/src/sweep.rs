//! One complete sweep cycle.
//!
//! # Design
//! - A cycle walks the root once; every eligible file runs transfer, announce,
//!   and remove in that order before the next entry is visited.
//! - A file is removed only after its object is committed and its announcement
//!   has been accepted.
//! - The first walk, transfer, announce, or remove error stops the cycle. The
//!   outcome carries the partial report so the scheduler decides what happens next.
//! - Too-new and non-regular entries are the only silent skips.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dumpsweep_config::SweepConfig;
use dumpsweep_notify::{Notifier, Sleeper, announce, announcement_text};
use dumpsweep_telemetry::{CycleResult, FileResult, Metrics};
use tracing::{info, info_span, warn};

use crate::age::{AgeFilter, Eligibility};
use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{FileCandidate, ObjectKey};
use crate::naming::KeyNamer;
use crate::remove::FileRemover;
use crate::scan::{Scanner, Visit};
use crate::store::ObjectStore;
use crate::transfer::TransferPipeline;

/// Collaborators required by a sweeper.
pub struct SweeperDeps {
    /// Process configuration.
    pub config: Arc<SweepConfig>,
    /// Destination object store.
    pub store: Arc<dyn ObjectStore>,
    /// Announcement channel.
    pub notifier: Arc<dyn Notifier>,
    /// Sleep used between rate-limited announcement attempts.
    pub sleeper: Arc<dyn Sleeper>,
    /// Local file deletion.
    pub remover: Arc<dyn FileRemover>,
    /// Metrics registry updated as the cycle progresses.
    pub metrics: Metrics,
}

/// A file that completed the whole pipeline during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// Local path that was removed.
    pub path: PathBuf,
    /// Object key it was stored under.
    pub key: ObjectKey,
    /// Store-reported location that was announced.
    pub location: String,
    /// Uncompressed size in bytes.
    pub bytes: u64,
    /// Announcement attempts, including rate-limited ones.
    pub announce_attempts: u32,
}

/// Progress made by a cycle, complete or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Non-directory entries visited by the walk.
    pub visited: usize,
    /// Files uploaded, announced, and removed.
    pub uploaded: Vec<UploadedObject>,
    /// Files left in place because they were modified after the cutoff.
    pub skipped_too_new: Vec<PathBuf>,
    /// Non-regular entries that were ignored.
    pub skipped_irregular: Vec<PathBuf>,
    /// Total uncompressed bytes uploaded.
    pub bytes_uploaded: u64,
}

/// Final state of a cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The walk visited every entry without a fatal error.
    Completed(CycleReport),
    /// The walk stopped at its first fatal error.
    Aborted {
        /// Work finished before the error.
        report: CycleReport,
        /// Error that stopped the walk.
        error: FsOpsError,
    },
}

impl CycleOutcome {
    /// Progress made by the cycle.
    #[must_use]
    pub const fn report(&self) -> &CycleReport {
        match self {
            Self::Completed(report) | Self::Aborted { report, .. } => report,
        }
    }

    /// Error that aborted the cycle, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&FsOpsError> {
        match self {
            Self::Completed(_) => None,
            Self::Aborted { error, .. } => Some(error),
        }
    }

    /// Whether the walk finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Convert into a `Result`, discarding the partial report on failure.
    ///
    /// # Errors
    ///
    /// Returns the aborting error when the cycle did not complete.
    pub fn into_result(self) -> FsOpsResult<CycleReport> {
        match self {
            Self::Completed(report) => Ok(report),
            Self::Aborted { error, .. } => Err(error),
        }
    }
}

/// Runs sweep cycles over the configured root.
pub struct Sweeper {
    config: Arc<SweepConfig>,
    namer: KeyNamer,
    pipeline: TransferPipeline,
    notifier: Arc<dyn Notifier>,
    sleeper: Arc<dyn Sleeper>,
    remover: Arc<dyn FileRemover>,
    metrics: Metrics,
}

impl Sweeper {
    /// Assemble a sweeper from its collaborators.
    #[must_use]
    pub fn new(deps: SweeperDeps) -> Self {
        let namer = KeyNamer::from_config(&deps.config);
        let pipeline = TransferPipeline::new(deps.store, deps.config.compression);
        Self {
            config: deps.config,
            namer,
            pipeline,
            notifier: deps.notifier,
            sleeper: deps.sleeper,
            remover: deps.remover,
            metrics: deps.metrics,
        }
    }

    /// Configuration this sweeper was built with.
    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run a cycle that starts now.
    pub fn run_cycle_now(&self) -> CycleOutcome {
        self.run_cycle(Utc::now())
    }

    /// Run one cycle whose age cutoff is derived from `started_at`.
    pub fn run_cycle(&self, started_at: DateTime<Utc>) -> CycleOutcome {
        let span = info_span!(
            "sweep_cycle",
            started_at = %started_at.to_rfc3339(),
            root = %self.config.root.display()
        );
        let _entered = span.enter();
        let clock = Instant::now();

        let filter = AgeFilter::new(started_at, self.config.min_age);
        let mut report = CycleReport::default();
        let result = self.walk(&filter, &mut report);
        let elapsed = clock.elapsed();

        match result {
            Ok(()) => {
                self.metrics.observe_cycle(CycleResult::Completed, elapsed);
                info!(
                    visited = report.visited,
                    uploaded = report.uploaded.len(),
                    skipped_too_new = report.skipped_too_new.len(),
                    bytes = report.bytes_uploaded,
                    "sweep cycle completed"
                );
                CycleOutcome::Completed(report)
            }
            Err(error) => {
                self.metrics.observe_cycle(CycleResult::Aborted, elapsed);
                warn!(
                    operation = error.operation(),
                    visited = report.visited,
                    uploaded = report.uploaded.len(),
                    "sweep cycle aborted"
                );
                CycleOutcome::Aborted { report, error }
            }
        }
    }

    fn walk(&self, filter: &AgeFilter, report: &mut CycleReport) -> FsOpsResult<()> {
        for visit in Scanner::new(&self.config.root) {
            let visit = visit?;
            report.visited += 1;
            match visit {
                Visit::Irregular(path) => {
                    self.metrics.inc_file(FileResult::SkippedIrregular);
                    report.skipped_irregular.push(path);
                }
                Visit::File(candidate) => match filter.evaluate(&candidate) {
                    Eligibility::TooNew => {
                        info!(
                            path = %candidate.path.display(),
                            modified = %candidate.modified.to_rfc3339(),
                            cutoff = %filter.cutoff().to_rfc3339(),
                            "skipping too-new file"
                        );
                        self.metrics.inc_file(FileResult::SkippedTooNew);
                        report.skipped_too_new.push(candidate.path);
                    }
                    Eligibility::Eligible => {
                        let uploaded = self.process(&candidate)?;
                        report.bytes_uploaded =
                            report.bytes_uploaded.saturating_add(uploaded.bytes);
                        report.uploaded.push(uploaded);
                    }
                },
            }
        }
        Ok(())
    }

    fn process(&self, candidate: &FileCandidate) -> FsOpsResult<UploadedObject> {
        let key = self.namer.key_for(&candidate.relative, candidate.modified);
        info!(
            path = %candidate.path.display(),
            key = %key,
            bytes = candidate.size,
            "uploading file ({} bytes)",
            candidate.size
        );

        let receipt = self.pipeline.transfer(candidate, &key)?;

        let text = announcement_text(&receipt.location, candidate.size);
        let announcement = announce(
            self.notifier.as_ref(),
            self.sleeper.as_ref(),
            self.config.notify_retry,
            &self.config.channel,
            &text,
        )
        .map_err(|source| FsOpsError::notify("announce", &key, source))?;
        if announcement.rate_limited > 0 {
            self.metrics
                .add_notify_rate_limited(u64::from(announcement.rate_limited));
        }

        self.remover
            .remove(&candidate.path)
            .map_err(|source| FsOpsError::io("remove", &candidate.path, source))?;

        self.metrics.inc_file(FileResult::Uploaded);
        self.metrics.add_bytes_uploaded(candidate.size);
        info!(
            path = %candidate.path.display(),
            key = %key,
            attempts = announcement.attempts,
            "file uploaded, announced, and removed"
        );

        Ok(UploadedObject {
            path: candidate.path.clone(),
            key,
            location: receipt.location,
            bytes: candidate.size,
            announce_attempts: announcement.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remove::FsRemover;
    use crate::store::LocalObjectStore;
    use chrono::TimeDelta;
    use dumpsweep_config::{Compression, FailurePolicy, NamingStrategy, RetryPolicy};
    use dumpsweep_notify::{Delivery, NotifyResult, ThreadSleeper};
    use std::error::Error;
    use std::fs::{self, File};
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::{Duration, SystemTime};

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl Notifier for Collect {
        fn post(&self, _channel: &str, text: &str) -> NotifyResult<Delivery> {
            if let Ok(mut posts) = self.0.lock() {
                posts.push(text.to_string());
            }
            Ok(Delivery::Posted)
        }
    }

    fn config(root: &Path) -> SweepConfig {
        SweepConfig {
            root: root.to_path_buf(),
            bucket: "dumps".into(),
            host: "web-1".into(),
            min_age: Duration::from_secs(60),
            interval: Duration::from_secs(60),
            channel: "C123".into(),
            naming: NamingStrategy::Flat,
            compression: Compression::None,
            notify_retry: RetryPolicy::unbounded(),
            on_cycle_failure: FailurePolicy::Continue,
        }
    }

    fn write_aged(path: &Path, body: &[u8], age: Duration) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, body)?;
        File::options()
            .write(true)
            .open(path)?
            .set_modified(SystemTime::now() - age)?;
        Ok(())
    }

    #[test]
    fn cycle_ships_old_files_and_keeps_new_ones() -> Result<(), Box<dyn Error>> {
        let root = tempfile::tempdir()?;
        let store_root = tempfile::tempdir()?;
        let old = root.path().join("app/core.old");
        let fresh = root.path().join("app/core.new");
        write_aged(&old, b"old dump", Duration::from_secs(600))?;
        write_aged(&fresh, b"new dump", Duration::ZERO)?;

        let notifier = Arc::new(Collect::default());
        let metrics = Metrics::new()?;
        let sweeper = Sweeper::new(SweeperDeps {
            config: Arc::new(config(root.path())),
            store: Arc::new(LocalObjectStore::new(store_root.path(), "dumps")),
            notifier: notifier.clone(),
            sleeper: Arc::new(ThreadSleeper),
            remover: Arc::new(FsRemover),
            metrics: metrics.clone(),
        });

        let outcome = sweeper.run_cycle(Utc::now() + TimeDelta::seconds(1));
        assert!(outcome.is_completed());
        let report = outcome.into_result()?;
        assert_eq!(report.visited, 2);
        assert_eq!(report.uploaded.len(), 1);
        assert_eq!(report.uploaded[0].path, old);
        assert_eq!(report.uploaded[0].bytes, 8);
        assert_eq!(report.skipped_too_new, vec![fresh.clone()]);
        assert!(!old.exists());
        assert!(fresh.exists());

        let posts = notifier.0.lock().map(|p| p.clone()).unwrap_or_default();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].contains("/dumps/web-1/app/core.old@"));
        assert!(posts[0].ends_with("(8 bytes)"));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles_completed, 1);
        assert_eq!(snapshot.files_uploaded, 1);
        assert_eq!(snapshot.files_skipped_too_new, 1);
        assert_eq!(snapshot.bytes_uploaded, 8);
        Ok(())
    }

    #[test]
    fn missing_root_aborts_without_progress() -> Result<(), Box<dyn Error>> {
        let root = tempfile::tempdir()?;
        let store_root = tempfile::tempdir()?;
        let metrics = Metrics::new()?;
        let sweeper = Sweeper::new(SweeperDeps {
            config: Arc::new(config(&root.path().join("absent"))),
            store: Arc::new(LocalObjectStore::new(store_root.path(), "dumps")),
            notifier: Arc::new(Collect::default()),
            sleeper: Arc::new(ThreadSleeper),
            remover: Arc::new(FsRemover),
            metrics: metrics.clone(),
        });

        let outcome = sweeper.run_cycle_now();
        assert!(!outcome.is_completed());
        assert_eq!(outcome.report(), &CycleReport::default());
        assert_eq!(outcome.error().map(FsOpsError::operation), Some("scan.walk"));
        assert_eq!(metrics.snapshot().cycles_aborted, 1);
        Ok(())
    }
}
