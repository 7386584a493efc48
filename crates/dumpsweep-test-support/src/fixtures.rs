//! Temporary sweep trees with controlled modification times.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dumpsweep_config::{Compression, FailurePolicy, NamingStrategy, RetryPolicy, SweepConfig};
use tempfile::TempDir;

/// Host name used by fixture configurations.
pub const FIXTURE_HOST: &str = "sweep-host";
/// Bucket used by fixture configurations.
pub const FIXTURE_BUCKET: &str = "crash-dumps";
/// Channel used by fixture configurations.
pub const FIXTURE_CHANNEL: &str = "C0FIXTURE";

/// A sweep root and a store root, both removed on drop.
pub struct SweepTree {
    root: TempDir,
    store: TempDir,
}

impl SweepTree {
    /// Create empty sweep and store directories.
    ///
    /// # Errors
    ///
    /// Returns an error if either temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            root: tempfile::tempdir().context("create sweep root")?,
            store: tempfile::tempdir().context("create store root")?,
        })
    }

    /// Directory being swept.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Directory standing in for the mounted bucket.
    #[must_use]
    pub fn store_root(&self) -> &Path {
        self.store.path()
    }

    /// Write `body` at `relative` below the root with mtime set to `modified`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or its mtime cannot be set.
    pub fn write_at(
        &self,
        relative: &str,
        body: &[u8],
        modified: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
        set_mtime(&path, SystemTime::from(modified))?;
        Ok(path)
    }

    /// Write `body` at `relative` with an mtime `age` before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or its mtime cannot be set.
    pub fn write_aged(
        &self,
        relative: &str,
        body: &[u8],
        now: DateTime<Utc>,
        age: Duration,
    ) -> Result<PathBuf> {
        let age = chrono::TimeDelta::from_std(age).context("age out of range")?;
        self.write_at(relative, body, now - age)
    }

    /// Configuration sweeping this tree with fixture identities.
    #[must_use]
    pub fn config(&self, naming: NamingStrategy, compression: Compression) -> SweepConfig {
        SweepConfig {
            root: self.root.path().to_path_buf(),
            bucket: FIXTURE_BUCKET.to_string(),
            host: FIXTURE_HOST.to_string(),
            min_age: Duration::from_secs(60),
            interval: Duration::from_secs(60),
            channel: FIXTURE_CHANNEL.to_string(),
            naming,
            compression,
            notify_retry: RetryPolicy::unbounded(),
            on_cycle_failure: FailurePolicy::Continue,
        }
    }
}

/// Set the modification time of an existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or updated.
pub fn set_mtime(path: &Path, modified: SystemTime) -> Result<()> {
    File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(modified))
        .with_context(|| format!("set mtime on {}", path.display()))
}

/// Truncate `at` to whole seconds, matching key and filesystem precision in assertions.
#[must_use]
pub fn whole_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}
