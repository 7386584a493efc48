//! Flag and environment surface for the daemon.
//!
//! Every option can be supplied as a flag or through its `DUMPSWEEP_*`
//! variable. The Slack token is read from `SLACK_TOKEN` only so it never
//! appears in process listings.

use std::path::PathBuf;

use clap::Parser;
use dumpsweep_config::SweepSettings;
use dumpsweep_notify::DEFAULT_SLACK_API_URL;

/// Environment variable carrying the Slack bot token.
pub const SLACK_TOKEN_ENV: &str = "SLACK_TOKEN";

/// Command-line options for `dumpsweep`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dumpsweep",
    version,
    about = "Ship aged crash dumps to object storage, announce them, and reclaim disk"
)]
pub struct Cli {
    /// Directory tree to sweep.
    #[arg(long, env = "DUMPSWEEP_ROOT")]
    pub root: Option<PathBuf>,
    /// Destination bucket name.
    #[arg(long, env = "DUMPSWEEP_BUCKET")]
    pub bucket: Option<String>,
    /// Object store: `s3://` or `gs://` for a remote bucket, otherwise the local
    /// mount point of the bucket (objects land in `{store_root}/{bucket}`).
    #[arg(long, env = "DUMPSWEEP_STORE_ROOT")]
    pub store_root: Option<PathBuf>,
    /// API endpoint for a remote store (e.g. a MinIO URL).
    #[arg(long, env = "DUMPSWEEP_STORE_ENDPOINT")]
    pub store_endpoint: Option<String>,
    /// Signing region for a remote store.
    #[arg(long, env = "DUMPSWEEP_STORE_REGION")]
    pub store_region: Option<String>,
    /// Time between sweep cycles (e.g. `30s`, `1m`).
    #[arg(long, env = "DUMPSWEEP_INTERVAL")]
    pub interval: Option<String>,
    /// Minimum file age before it is eligible for upload.
    #[arg(long, env = "DUMPSWEEP_MIN_AGE")]
    pub min_age: Option<String>,
    /// Slack channel receiving upload announcements.
    #[arg(long = "slack-channel-id", env = "DUMPSWEEP_SLACK_CHANNEL")]
    pub channel: Option<String>,
    /// Object naming strategy: `flat` or `date-partitioned`.
    #[arg(long, env = "DUMPSWEEP_NAMING")]
    pub naming: Option<String>,
    /// Upload compression: `gzip` or `none`.
    #[arg(long, env = "DUMPSWEEP_COMPRESSION")]
    pub compression: Option<String>,
    /// Give up announcing after this many rate-limited attempts (default: never).
    #[arg(long, env = "DUMPSWEEP_NOTIFY_MAX_ATTEMPTS")]
    pub notify_max_attempts: Option<u32>,
    /// Reaction to an aborted cycle: `continue` or `exit`.
    #[arg(long, env = "DUMPSWEEP_ON_CYCLE_FAILURE")]
    pub on_cycle_failure: Option<String>,
    /// Host identity used in object keys (defaults to the system hostname).
    #[arg(long, env = "DUMPSWEEP_HOST")]
    pub host: Option<String>,
    /// Base URL of the Slack Web API.
    #[arg(long, env = "DUMPSWEEP_SLACK_API_URL", default_value = DEFAULT_SLACK_API_URL)]
    pub slack_api_url: String,
    /// Timeout for a single Slack request, as a duration (default: none).
    #[arg(long, env = "DUMPSWEEP_SLACK_TIMEOUT")]
    pub slack_timeout: Option<String>,
    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, env = "DUMPSWEEP_LOG_LEVEL")]
    pub log_level: Option<String>,
    /// Log output format: `json` or `pretty`.
    #[arg(long, env = "DUMPSWEEP_LOG_FORMAT")]
    pub log_format: Option<String>,
    /// Write Prometheus metrics to this file after every cycle.
    #[arg(long, env = "DUMPSWEEP_METRICS_TEXTFILE")]
    pub metrics_textfile: Option<PathBuf>,
    /// Run a single cycle immediately and exit.
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Collect the sweep settings, using `host` as the resolved host identity.
    #[must_use]
    pub fn settings(&self, host: String) -> SweepSettings {
        SweepSettings {
            root: self.root.clone(),
            bucket: self.bucket.clone(),
            host: Some(host),
            min_age: self.min_age.clone(),
            interval: self.interval.clone(),
            channel: self.channel.clone(),
            naming: self.naming.clone(),
            compression: self.compression.clone(),
            notify_max_attempts: self.notify_max_attempts,
            on_cycle_failure: self.on_cycle_failure.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_onto_settings() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "dumpsweep",
            "--root",
            "/srv/crash",
            "--bucket",
            "dumps",
            "--store-root",
            "/mnt/gcs",
            "--interval",
            "30s",
            "--min-age",
            "5m",
            "--slack-channel-id",
            "C42",
            "--naming",
            "date-partitioned",
            "--compression",
            "none",
            "--notify-max-attempts",
            "5",
            "--on-cycle-failure",
            "exit",
            "--once",
        ])?;
        assert!(cli.once);
        assert_eq!(cli.store_root, Some(PathBuf::from("/mnt/gcs")));
        assert_eq!(cli.slack_api_url, DEFAULT_SLACK_API_URL);
        assert_eq!(cli.slack_timeout, None);
        assert_eq!(cli.store_endpoint, None);

        let settings = cli.settings("web-1".into());
        assert_eq!(settings.root, Some(PathBuf::from("/srv/crash")));
        assert_eq!(settings.host.as_deref(), Some("web-1"));
        assert_eq!(settings.interval.as_deref(), Some("30s"));
        assert_eq!(settings.min_age.as_deref(), Some("5m"));
        assert_eq!(settings.channel.as_deref(), Some("C42"));
        assert_eq!(settings.naming.as_deref(), Some("date-partitioned"));
        assert_eq!(settings.compression.as_deref(), Some("none"));
        assert_eq!(settings.notify_max_attempts, Some(5));
        assert_eq!(settings.on_cycle_failure.as_deref(), Some("exit"));
        Ok(())
    }
}
