//! Process bootstrap.
//!
//! # Design
//! - Order: parse flags, install logging, resolve the host, validate config,
//!   build collaborators, then hand off to the scheduler.
//! - The blocking Slack client is built and dropped outside the async runtime;
//!   the runtime is created explicitly for that reason.
//! - The runtime exists before the collaborators so a remote object store can
//!   drive its client from the blocking cycle thread.
//! - Configuration problems exit with 2, runtime failures with 1.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dumpsweep_config::{
    ConfigError, StoreTarget, SweepConfig, build_config, parse_duration, parse_store_target,
    require_token,
};
use dumpsweep_fsops::{
    FsRemover, LocalObjectStore, ObjectStore, RemoteObjectStore, RemoteStoreSettings, Sweeper,
    SweeperDeps,
};
use dumpsweep_notify::{SlackNotifier, ThreadSleeper};
use dumpsweep_telemetry::{
    DEFAULT_LOG_LEVEL, GlobalContextGuard, LogFormat, LoggingConfig, Metrics, init_logging,
};
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::cli::{Cli, SLACK_TOKEN_ENV};
use crate::error::{AppError, AppResult};
use crate::scheduler::{Scheduler, shutdown_signal};

/// Parse the process arguments, run the daemon, and return the exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    let token = std::env::var(SLACK_TOKEN_ENV).ok();
    match run_with(&cli, token) {
        Ok(()) => 0,
        Err(err) => {
            error!(error = %err, "dumpsweep stopped");
            eprintln!("error: {}", err.display_chain());
            err.exit_code()
        }
    }
}

/// Install logging and run the daemon described by `cli`.
///
/// # Errors
///
/// Returns an error if logging cannot be installed, the configuration is
/// invalid, or the scheduler stops on a failure.
pub fn run_with(cli: &Cli, token: Option<String>) -> AppResult<()> {
    let logging = LoggingConfig {
        level: cli.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL),
        format: LogFormat::from_name(cli.log_format.as_deref()),
        ..LoggingConfig::default()
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;

    Daemon::from_cli(cli, token)?.run()
}

/// Fully wired sweeper ready to be scheduled.
pub struct Daemon {
    config: Arc<SweepConfig>,
    sweeper: Arc<Sweeper>,
    metrics: Metrics,
    metrics_textfile: Option<PathBuf>,
    once: bool,
    runtime: Runtime,
}

impl Daemon {
    /// Build production collaborators from flags and the Slack token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingEnv` when the token or store root is absent,
    /// `AppError::Config` for invalid settings, `AppError::Notify` when the
    /// Slack client cannot be built, and `AppError::Io` when the runtime cannot
    /// be started.
    pub fn from_cli(cli: &Cli, token: Option<String>) -> AppResult<Self> {
        let host = match &cli.host {
            Some(host) => host.clone(),
            None => resolve_hostname()?,
        };
        let config = build_config(cli.settings(host))
            .map_err(|err| AppError::config("build_config", err))?;
        let token = require_token(token).map_err(|_| AppError::MissingEnv {
            name: SLACK_TOKEN_ENV,
        })?;
        let store_root = cli.store_root.clone().ok_or(AppError::MissingEnv {
            name: "DUMPSWEEP_STORE_ROOT",
        })?;
        let target = parse_store_target(&store_root, &config.bucket)
            .map_err(|err| AppError::config("store_root", err))?;
        let slack_timeout = cli
            .slack_timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(|err| AppError::config("slack_timeout", err))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| AppError::io("runtime.build", None, err))?;

        let notifier = SlackNotifier::new(token, &cli.slack_api_url, slack_timeout)
            .map_err(|err| AppError::notify("slack.new", err))?;
        let metrics = Metrics::new().map_err(|err| AppError::telemetry("metrics.new", err))?;
        let store: Arc<dyn ObjectStore> = match target {
            StoreTarget::Mounted(path) => {
                Arc::new(LocalObjectStore::new(path, config.bucket.clone()))
            }
            StoreTarget::Remote(scheme) => Arc::new(RemoteObjectStore::connect(
                RemoteStoreSettings {
                    scheme,
                    bucket: config.bucket.clone(),
                    endpoint: cli.store_endpoint.clone(),
                    region: cli.store_region.clone(),
                },
                runtime.handle().clone(),
            )),
        };

        let config = Arc::new(config);
        let sweeper = Sweeper::new(SweeperDeps {
            config: Arc::clone(&config),
            store,
            notifier: Arc::new(notifier),
            sleeper: Arc::new(ThreadSleeper),
            remover: Arc::new(FsRemover),
            metrics: metrics.clone(),
        });

        Ok(Self {
            config,
            sweeper: Arc::new(sweeper),
            metrics,
            metrics_textfile: cli.metrics_textfile.clone(),
            once: cli.once,
            runtime,
        })
    }

    /// Validated configuration the daemon runs with.
    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Metrics registry shared with the sweeper.
    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run the scheduler until shutdown, or a single cycle with `--once`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler stops on a failure.
    pub fn run(self) -> AppResult<()> {
        let _context = GlobalContextGuard::new(self.config.host.clone());
        info!(
            root = %self.config.root.display(),
            bucket = %self.config.bucket,
            channel = %self.config.channel,
            naming = %self.config.naming,
            compression = %self.config.compression,
            on_cycle_failure = self.config.on_cycle_failure.as_str(),
            once = self.once,
            "dumpsweep starting"
        );

        let scheduler = Scheduler::new(
            Arc::clone(&self.sweeper),
            self.config.interval,
            self.config.on_cycle_failure,
            self.metrics.clone(),
        )
        .with_metrics_textfile(self.metrics_textfile.clone());

        let result = if self.once {
            self.runtime.block_on(scheduler.run_once())
        } else {
            self.runtime.block_on(scheduler.run(shutdown_signal()))
        };
        drop(scheduler);
        drop(self.runtime);

        if result.is_ok() {
            info!("dumpsweep stopped");
        }
        result
    }
}

fn resolve_hostname() -> AppResult<String> {
    let raw = nix::unistd::gethostname()
        .map_err(|errno| AppError::io("hostname", None, io::Error::from(errno)))?;
    raw.into_string().map_err(|raw| {
        AppError::config(
            "hostname",
            ConfigError::InvalidField {
                field: "host",
                value: Some(raw.to_string_lossy().into_owned()),
                reason: "not_utf8",
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EXIT_CONFIG, EXIT_FAILURE};
    use dumpsweep_config::{Compression, NamingStrategy};

    fn cli(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("dumpsweep").chain(args.iter().copied()))
    }

    fn base_args(store_root: &str) -> Vec<String> {
        [
            "--root",
            "/var/crash",
            "--bucket",
            "dumps",
            "--slack-channel-id",
            "C42",
            "--host",
            "web-1",
            "--store-root",
            store_root,
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    fn parse(args: &[String]) -> Result<Cli, clap::Error> {
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cli(&refs)
    }

    #[test]
    fn daemon_applies_defaults_and_overrides() -> anyhow::Result<()> {
        let store = tempfile::tempdir()?;
        let store_root = store.path().display().to_string();
        let mut args = base_args(&store_root);
        args.extend(["--compression".to_string(), "none".to_string()]);

        let daemon = Daemon::from_cli(&parse(&args)?, Some("xoxb-1".into()))?;
        let config = daemon.config();
        assert_eq!(config.host, "web-1");
        assert_eq!(config.interval, std::time::Duration::from_secs(60));
        assert_eq!(config.min_age, std::time::Duration::from_secs(60));
        assert_eq!(config.naming, NamingStrategy::Flat);
        assert_eq!(config.compression, Compression::None);
        assert_eq!(daemon.metrics().snapshot().cycles_completed, 0);
        Ok(())
    }

    #[test]
    fn missing_token_is_a_configuration_error() -> anyhow::Result<()> {
        let args = base_args("/mnt/store");
        let Err(err) = Daemon::from_cli(&parse(&args)?, None) else {
            anyhow::bail!("expected missing token error");
        };
        assert!(matches!(err, AppError::MissingEnv { name: "SLACK_TOKEN" }));
        assert_eq!(err.exit_code(), EXIT_CONFIG);

        let Err(err) = Daemon::from_cli(&parse(&args)?, Some("  ".into())) else {
            anyhow::bail!("expected blank token error");
        };
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        Ok(())
    }

    #[test]
    fn missing_bucket_and_store_root_are_configuration_errors() -> anyhow::Result<()> {
        let no_bucket = cli(&[
            "--slack-channel-id",
            "C42",
            "--host",
            "web-1",
            "--store-root",
            "/mnt",
        ])?;
        let Err(err) = Daemon::from_cli(&no_bucket, Some("xoxb".into())) else {
            anyhow::bail!("expected missing bucket error");
        };
        assert!(matches!(
            err,
            AppError::Config {
                source: ConfigError::Missing { field: "bucket" },
                ..
            }
        ));

        let no_store = cli(&["--bucket", "dumps", "--slack-channel-id", "C42", "--host", "web-1"])?;
        let Err(err) = Daemon::from_cli(&no_store, Some("xoxb".into())) else {
            anyhow::bail!("expected missing store root error");
        };
        assert!(matches!(
            err,
            AppError::MissingEnv {
                name: "DUMPSWEEP_STORE_ROOT"
            }
        ));
        Ok(())
    }

    #[test]
    fn invalid_slack_url_is_a_runtime_error() -> anyhow::Result<()> {
        let mut args = base_args("/mnt/store");
        args.extend(["--slack-api-url".to_string(), "not a url".to_string()]);
        let Err(err) = Daemon::from_cli(&parse(&args)?, Some("xoxb".into())) else {
            anyhow::bail!("expected endpoint error");
        };
        assert!(matches!(err, AppError::Notify { operation: "slack.new", .. }));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        Ok(())
    }

    #[test]
    fn store_url_selects_the_remote_backend() -> anyhow::Result<()> {
        let args = base_args("gs://dumps");
        let daemon = Daemon::from_cli(&parse(&args)?, Some("xoxb".into()))?;
        assert_eq!(daemon.config().bucket, "dumps");

        let args = base_args("gs://other-bucket");
        let Err(err) = Daemon::from_cli(&parse(&args)?, Some("xoxb".into())) else {
            anyhow::bail!("expected bucket mismatch error");
        };
        assert!(matches!(
            err,
            AppError::Config {
                operation: "store_root",
                source: ConfigError::InvalidField {
                    field: "store_root",
                    ..
                },
            }
        ));
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        Ok(())
    }

    #[test]
    fn slack_timeout_is_unbounded_unless_given() -> anyhow::Result<()> {
        let store = tempfile::tempdir()?;
        let store_root = store.path().display().to_string();
        let args = base_args(&store_root);
        assert_eq!(parse(&args)?.slack_timeout, None);
        Daemon::from_cli(&parse(&args)?, Some("xoxb".into()))?;

        let mut args = base_args(&store_root);
        args.extend(["--slack-timeout".to_string(), "soon".to_string()]);
        let Err(err) = Daemon::from_cli(&parse(&args)?, Some("xoxb".into())) else {
            anyhow::bail!("expected invalid timeout error");
        };
        assert!(matches!(
            err,
            AppError::Config {
                operation: "slack_timeout",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn system_hostname_is_used_without_override() -> anyhow::Result<()> {
        let host = resolve_hostname()?;
        assert!(!host.is_empty());
        Ok(())
    }
}
