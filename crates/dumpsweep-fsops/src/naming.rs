//! Deterministic object keys.
//!
//! # Design
//! - A key is a pure function of (host, relative path, mtime truncated to seconds).
//! - The host is always a key segment so hosts sharing a path never overwrite each other.
//! - Relative paths are joined with `/` on every platform.
//! - Path segments are percent-encoded from their raw bytes (controls, `%`, and
//!   every non-ASCII byte), so distinct file names always map to distinct keys.

use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use dumpsweep_config::{Compression, NamingStrategy, SweepConfig};
use percent_encoding::{AsciiSet, CONTROLS, percent_encode};

use crate::model::ObjectKey;

const FLAT_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%SZ";
const DATE_PARTITION: &str = "%Y/%m/%d";
const KEY_SEGMENT: &AsciiSet = &CONTROLS.add(b'%');

/// Derives remote object keys for candidates.
#[derive(Debug, Clone)]
pub struct KeyNamer {
    host: String,
    naming: NamingStrategy,
    compression: Compression,
}

impl KeyNamer {
    /// Build a namer for an explicit host and strategy.
    #[must_use]
    pub fn new(host: impl Into<String>, naming: NamingStrategy, compression: Compression) -> Self {
        Self {
            host: host.into(),
            naming,
            compression,
        }
    }

    /// Build a namer from the process configuration.
    #[must_use]
    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.host.clone(), config.naming, config.compression)
    }

    /// Compute the key for a file at `relative` (root prefix already stripped).
    #[must_use]
    pub fn key_for(&self, relative: &Path, modified: DateTime<Utc>) -> ObjectKey {
        let relative = key_path(relative);
        let key = match self.naming {
            NamingStrategy::Flat => format!(
                "{}/{}@{}{}",
                self.host,
                relative,
                modified.format(FLAT_TIMESTAMP),
                self.compression.file_suffix()
            ),
            NamingStrategy::DatePartitioned => format!(
                "{}/{}/{}",
                modified.format(DATE_PARTITION),
                self.host,
                relative
            ),
        };
        ObjectKey::new(key)
    }
}

fn key_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => {
                Some(percent_encode(part.as_encoded_bytes(), KEY_SEGMENT).to_string())
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
