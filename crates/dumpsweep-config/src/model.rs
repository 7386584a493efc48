//! Typed configuration models.
//!
//! # Design
//! - `SweepConfig` is built once at startup and shared read-only for the process lifetime.
//! - Strategy selectors are plain enums so every component matches on them exhaustively.
//! - `SweepSettings` is the unvalidated shape collected from flags and environment.

use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Immutable configuration shared by every sweep component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Local directory tree that is swept each cycle.
    pub root: PathBuf,
    /// Destination bucket identifier.
    pub bucket: String,
    /// Host identity embedded in every object key.
    pub host: String,
    /// Minimum modification age before a file is eligible.
    pub min_age: Duration,
    /// Interval between scheduler ticks.
    pub interval: Duration,
    /// Notification channel that receives upload announcements.
    pub channel: String,
    /// Object key layout.
    pub naming: NamingStrategy,
    /// Streaming compression applied during transfer.
    pub compression: Compression,
    /// Retry behaviour when the notification service rate-limits a post.
    pub notify_retry: RetryPolicy,
    /// What the scheduler does after a cycle aborts.
    pub on_cycle_failure: FailurePolicy,
}

/// Raw settings as collected from flags and environment, prior to validation.
#[derive(Debug, Clone, Default)]
pub struct SweepSettings {
    /// Directory to sweep.
    pub root: Option<PathBuf>,
    /// Destination bucket.
    pub bucket: Option<String>,
    /// Host identity, usually the machine hostname.
    pub host: Option<String>,
    /// Minimum age, e.g. `1m`.
    pub min_age: Option<String>,
    /// Tick interval, e.g. `30s`.
    pub interval: Option<String>,
    /// Notification channel identifier.
    pub channel: Option<String>,
    /// Naming strategy (`flat` or `date-partitioned`).
    pub naming: Option<String>,
    /// Compression (`gzip` or `none`).
    pub compression: Option<String>,
    /// Maximum rate-limited attempts; unset retries until success.
    pub notify_max_attempts: Option<u32>,
    /// Cycle failure policy (`continue` or `exit`).
    pub on_cycle_failure: Option<String>,
}

/// Layout of remote object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingStrategy {
    /// `{host}/{path}@{mtime}{suffix}`.
    Flat,
    /// `{yyyy}/{mm}/{dd}/{host}/{path}` without a suffix.
    DatePartitioned,
}

impl NamingStrategy {
    /// Render the strategy as its configuration string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::DatePartitioned => "date-partitioned",
        }
    }
}

impl FromStr for NamingStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "flat" => Ok(Self::Flat),
            "date-partitioned" | "date_partitioned" => Ok(Self::DatePartitioned),
            other => Err(ConfigError::invalid("naming", other, "unknown_strategy")),
        }
    }
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Streaming compression applied between the local file and the object writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Gzip-compress the stream.
    Gzip,
    /// Store the bytes unchanged.
    None,
}

impl Compression {
    /// Render the compression as its configuration string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::None => "none",
        }
    }

    /// File-name suffix identifying the stored format.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Gzip => ".gz",
            Self::None => "",
        }
    }
}

impl FromStr for Compression {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "gzip" | "gz" => Ok(Self::Gzip),
            "none" | "identity" => Ok(Self::None),
            other => Err(ConfigError::invalid("compression", other, "unknown_compression")),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry behaviour for rate-limited notification posts.
///
/// The default retries until the post succeeds. A bounded policy stops after
/// `max_attempts` rate-limited responses and fails the cycle instead of stalling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Upper bound on rate-limited attempts; `None` is unbounded.
    pub max_attempts: Option<NonZeroU32>,
}

impl RetryPolicy {
    /// Retry until the notification service accepts the post.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    /// Give up after `attempts` rate-limited responses.
    #[must_use]
    pub const fn bounded(attempts: NonZeroU32) -> Self {
        Self {
            max_attempts: Some(attempts),
        }
    }

    /// Whether another attempt is allowed after `attempts` rate-limited responses.
    #[must_use]
    pub fn allows_retry_after(self, attempts: u32) -> bool {
        self.max_attempts
            .is_none_or(|limit| attempts < limit.get())
    }
}

/// Scheduler reaction to an aborted sweep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and wait for the next tick.
    #[default]
    Continue,
    /// Stop the scheduler and exit the process with a failure status.
    Exit,
}

impl FailurePolicy {
    /// Render the policy as its configuration string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Exit => "exit",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "continue" => Ok(Self::Continue),
            "exit" => Ok(Self::Exit),
            other => Err(ConfigError::invalid("on_cycle_failure", other, "unknown_policy")),
        }
    }
}

/// Backend that receives uploaded objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// Bucket mounted into the local filesystem; objects live below `{path}/{bucket}`.
    Mounted(PathBuf),
    /// Bucket reached over an S3-compatible API.
    Remote(RemoteScheme),
}

/// URL scheme naming a remote object-store provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteScheme {
    /// Amazon S3 or any S3-compatible service (`s3://`).
    S3,
    /// Google Cloud Storage through its S3 interoperability API (`gs://`).
    Gcs,
}

impl RemoteScheme {
    /// Scheme as written in store URLs and announced locations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Gcs => "gs",
        }
    }

    /// Endpoint used when none is configured; `None` defers to the SDK.
    #[must_use]
    pub const fn default_endpoint(self) -> Option<&'static str> {
        match self {
            Self::S3 => None,
            Self::Gcs => Some("https://storage.googleapis.com"),
        }
    }

    /// Signing region used when none is configured; `None` defers to the SDK.
    #[must_use]
    pub const fn default_region(self) -> Option<&'static str> {
        match self {
            Self::S3 => None,
            Self::Gcs => Some("auto"),
        }
    }
}

impl fmt::Display for RemoteScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification service access token supplied out of band.
#[derive(Clone, PartialEq, Eq)]
pub struct SlackToken(String);

impl SlackToken {
    /// Wrap a raw token value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Expose the token for building an authorization header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SlackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SlackToken(<redacted>)")
    }
}
