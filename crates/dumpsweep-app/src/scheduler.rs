//! Fixed-interval sweep scheduling.
//!
//! # Design
//! - The first tick fires one interval after start; `--once` bypasses the ticker.
//! - Each tick awaits one blocking cycle before the ticker is polled again, so
//!   cycles never overlap. Ticks missed while a cycle runs are skipped, not queued.
//! - Shutdown is only observed between cycles; a running cycle always finishes.
//! - The failure policy is applied here, not inside the cycle.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dumpsweep_config::FailurePolicy;
use dumpsweep_fsops::{CycleOutcome, Sweeper};
use dumpsweep_telemetry::Metrics;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{Span, error, info, warn};

use crate::error::{AppError, AppResult};

/// One unit of scheduled work.
pub trait CycleRunner: Send + Sync + 'static {
    /// Run a complete cycle on the calling (blocking) thread.
    fn run_cycle(&self) -> CycleOutcome;
}

impl CycleRunner for Sweeper {
    fn run_cycle(&self) -> CycleOutcome {
        self.run_cycle_now()
    }
}

/// Drives a `CycleRunner` on a fixed interval.
pub struct Scheduler<R: CycleRunner> {
    runner: Arc<R>,
    interval: Duration,
    policy: FailurePolicy,
    metrics: Metrics,
    metrics_textfile: Option<PathBuf>,
}

impl<R: CycleRunner> Scheduler<R> {
    /// Build a scheduler for `runner`.
    #[must_use]
    pub const fn new(
        runner: Arc<R>,
        interval: Duration,
        policy: FailurePolicy,
        metrics: Metrics,
    ) -> Self {
        Self {
            runner,
            interval,
            policy,
            metrics,
            metrics_textfile: None,
        }
    }

    /// Write the metrics exposition to `path` after every cycle.
    #[must_use]
    pub fn with_metrics_textfile(mut self, path: Option<PathBuf>) -> Self {
        self.metrics_textfile = path;
        self
    }

    /// Run a single cycle immediately.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CycleAborted` if the cycle aborted, regardless of the
    /// failure policy, and `AppError::Join` if the cycle task panicked.
    pub async fn run_once(&self) -> AppResult<()> {
        match self.cycle().await? {
            CycleOutcome::Completed(_) => Ok(()),
            CycleOutcome::Aborted { error, .. } => Err(AppError::cycle_aborted(error)),
        }
    }

    /// Tick until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CycleAborted` when a cycle aborts under
    /// `FailurePolicy::Exit`, and `AppError::Join` if a cycle task panicked.
    pub async fn run<F>(&self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval_ms = millis(self.interval), "scheduler started");
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("shutdown requested, scheduler stopping");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            let outcome = self.cycle().await?;
            if let CycleOutcome::Aborted { error, .. } = outcome {
                match self.policy {
                    FailurePolicy::Continue => {
                        info!("waiting for next tick after aborted cycle");
                    }
                    FailurePolicy::Exit => return Err(AppError::cycle_aborted(error)),
                }
            }
        }
    }

    async fn cycle(&self) -> AppResult<CycleOutcome> {
        let runner = Arc::clone(&self.runner);
        let span = Span::current();
        let outcome = tokio::task::spawn_blocking(move || span.in_scope(|| runner.run_cycle()))
            .await
            .map_err(|source| AppError::Join { source })?;

        if let CycleOutcome::Aborted { report, error } = &outcome {
            error!(
                operation = error.operation(),
                error = %error,
                detail = ?error,
                uploaded = report.uploaded.len(),
                "sweep cycle aborted"
            );
        }
        self.export_metrics();
        Ok(outcome)
    }

    fn export_metrics(&self) {
        let Some(path) = &self.metrics_textfile else {
            return;
        };
        if let Err(err) = self.metrics.write_textfile(path) {
            warn!(path = %path.display(), error = %err, "failed to write metrics textfile");
        }
    }
}

/// Resolve when the process receives ctrl-c or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
