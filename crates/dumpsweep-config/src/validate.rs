//! Validation helpers that turn raw settings into a `SweepConfig`.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults::{
    DEFAULT_COMPRESSION, DEFAULT_FAILURE_POLICY, DEFAULT_INTERVAL, DEFAULT_MIN_AGE,
    DEFAULT_NAMING, DEFAULT_ROOT,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    Compression, FailurePolicy, NamingStrategy, RemoteScheme, RetryPolicy, SlackToken,
    StoreTarget, SweepConfig, SweepSettings,
};

/// Validate raw settings and build the immutable process configuration.
///
/// # Errors
///
/// Returns `ConfigError::Missing` when a required setting is absent and
/// `ConfigError::InvalidField` when a value cannot be used.
pub fn build_config(settings: SweepSettings) -> ConfigResult<SweepConfig> {
    let root = settings
        .root
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
    if root.as_os_str().is_empty() {
        return Err(ConfigError::Missing { field: "root" });
    }

    let bucket = required_text("bucket", settings.bucket)?;
    let channel = required_text("channel", settings.channel)?;
    let host = required_text("host", settings.host)?;
    if host.contains('/') {
        return Err(ConfigError::invalid("host", host, "contains_separator"));
    }

    let interval = parse_duration_field(
        "interval",
        settings.interval.as_deref().unwrap_or(DEFAULT_INTERVAL),
    )?;
    if interval.is_zero() {
        return Err(ConfigError::invalid(
            "interval",
            settings.interval.unwrap_or_default(),
            "zero",
        ));
    }
    let min_age = parse_duration_field(
        "min_age",
        settings.min_age.as_deref().unwrap_or(DEFAULT_MIN_AGE),
    )?;

    let naming = settings
        .naming
        .as_deref()
        .unwrap_or(DEFAULT_NAMING)
        .parse::<NamingStrategy>()?;
    let compression = settings
        .compression
        .as_deref()
        .unwrap_or(DEFAULT_COMPRESSION)
        .parse::<Compression>()?;
    let on_cycle_failure = settings
        .on_cycle_failure
        .as_deref()
        .unwrap_or(DEFAULT_FAILURE_POLICY)
        .parse::<FailurePolicy>()?;

    let notify_retry = match settings.notify_max_attempts {
        None => RetryPolicy::unbounded(),
        Some(raw) => NonZeroU32::new(raw)
            .map(RetryPolicy::bounded)
            .ok_or_else(|| ConfigError::invalid("notify_max_attempts", raw.to_string(), "zero"))?,
    };

    Ok(SweepConfig {
        root,
        bucket,
        host,
        min_age,
        interval,
        channel,
        naming,
        compression,
        notify_retry,
        on_cycle_failure,
    })
}

/// Require the notification access token to be present and non-blank.
///
/// # Errors
///
/// Returns `ConfigError::Missing` when the token is absent or blank.
pub fn require_token(raw: Option<String>) -> ConfigResult<SlackToken> {
    required_text("slack_token", raw).map(SlackToken::new)
}

/// Resolve `--store-root` into a mounted path or a remote provider.
///
/// `s3://` and `gs://` select a remote store; anything after the scheme must be
/// empty or repeat `bucket`. Every other value is a filesystem path.
///
/// # Errors
///
/// Returns `ConfigError::Missing` for an empty value and
/// `ConfigError::InvalidField` when a store URL names a different bucket.
pub fn parse_store_target(raw: &Path, bucket: &str) -> ConfigResult<StoreTarget> {
    if raw.as_os_str().is_empty() {
        return Err(ConfigError::Missing {
            field: "store_root",
        });
    }
    let Some(text) = raw.to_str() else {
        return Ok(StoreTarget::Mounted(raw.to_path_buf()));
    };
    let remote = [RemoteScheme::S3, RemoteScheme::Gcs]
        .into_iter()
        .find_map(|scheme| {
            text.strip_prefix(scheme.as_str())
                .and_then(|rest| rest.strip_prefix("://"))
                .map(|rest| (scheme, rest.trim_matches('/')))
        });
    match remote {
        None => Ok(StoreTarget::Mounted(raw.to_path_buf())),
        Some((scheme, named)) if named.is_empty() || named == bucket => {
            Ok(StoreTarget::Remote(scheme))
        }
        Some(_) => Err(ConfigError::invalid("store_root", text, "bucket_mismatch")),
    }
}

/// Parse a human-friendly duration such as `500ms`, `30s`, `1m`, or `1h30m`.
///
/// A bare integer is read as seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the input is empty, has an unknown
/// unit, or overflows.
pub fn parse_duration(input: &str) -> ConfigResult<Duration> {
    parse_duration_field("duration", input)
}

fn parse_duration_field(field: &'static str, input: &str) -> ConfigResult<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(field, input, "empty"));
    }
    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    let mut total = Duration::ZERO;
    let mut rest = trimmed;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(ConfigError::invalid(field, input, "expected_number"));
        }
        let amount = rest[..digits_end]
            .parse::<u64>()
            .map_err(|_| ConfigError::invalid(field, input, "overflow"))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|ch: char| ch.is_ascii_digit())
            .unwrap_or(rest.len());
        let component = match &rest[..unit_end] {
            "ms" => Duration::from_millis(amount),
            "s" => Duration::from_secs(amount),
            "m" => amount
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::invalid(field, input, "overflow"))?,
            "h" => amount
                .checked_mul(3_600)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::invalid(field, input, "overflow"))?,
            "" => return Err(ConfigError::invalid(field, input, "missing_unit")),
            _ => return Err(ConfigError::invalid(field, input, "unknown_unit")),
        };
        total = total
            .checked_add(component)
            .ok_or_else(|| ConfigError::invalid(field, input, "overflow"))?;
        rest = &rest[unit_end..];
    }
    Ok(total)
}

fn required_text(field: &'static str, value: Option<String>) -> ConfigResult<String> {
    match value.map(|raw| raw.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ConfigError::Missing { field }),
    }
}
