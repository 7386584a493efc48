//! Local deletion of transferred files.

use std::fs;
use std::io;
use std::path::Path;

/// Deletes a local file once its upload and announcement have succeeded.
pub trait FileRemover: Send + Sync {
    /// Remove the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if the file could not be removed.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Removes files with `std::fs::remove_file`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl FileRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
