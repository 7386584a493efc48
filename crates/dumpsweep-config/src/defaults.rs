//! Process defaults applied when a setting is not supplied.
//!
//! # Design
//! - Keep every default in one place so the CLI help and validation agree.
//! - Durations are spelled the same way operators type them on the command line.

/// Directory swept when `--root` is not provided.
pub const DEFAULT_ROOT: &str = "/var/crash";
/// Tick interval between sweep cycles.
pub const DEFAULT_INTERVAL: &str = "1m";
/// Minimum modification age before a file becomes eligible.
pub const DEFAULT_MIN_AGE: &str = "1m";
/// Naming strategy used for remote object keys.
pub const DEFAULT_NAMING: &str = "flat";
/// Compression applied while streaming to the object store.
pub const DEFAULT_COMPRESSION: &str = "gzip";
/// Scheduler behaviour after a cycle aborts.
pub const DEFAULT_FAILURE_POLICY: &str = "continue";
