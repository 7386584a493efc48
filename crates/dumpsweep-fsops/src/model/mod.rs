//! Domain models for the sweep pipeline.
//!
//! # Design
//! - Candidates are produced fresh by every walk and never cached across cycles.
//! - Object keys are plain strings behind a newtype so they cannot be confused with paths.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// A regular file discovered during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Absolute (or root-joined) path of the file.
    pub path: PathBuf,
    /// Path relative to the sweep root.
    pub relative: PathBuf,
    /// Modification time read by the stat call at visit time.
    pub modified: DateTime<Utc>,
    /// Size in bytes reported by the same stat call.
    pub size: u64,
}

/// Remote object key assigned to a transferred file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Wrap a precomputed key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the `/`-separated segments of the key.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
