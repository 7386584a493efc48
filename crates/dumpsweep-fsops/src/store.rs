//! Object-store port and the local (mounted bucket) backend.
//!
//! # Design
//! - The sweep only needs "open a write stream at key K, report success on close".
//! - An object becomes visible only on `commit`; dropping a writer abandons it.
//! - Writing the same key twice replaces the earlier object (last write wins).

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::ObjectKey;

/// Streaming writer for a single remote object.
pub trait ObjectWriter: Write + Send {
    /// Finalise the object so it becomes durable and visible under its key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not make the object durable.
    fn commit(self: Box<Self>) -> io::Result<()>;
}

/// Durable object storage addressed by bucket and key.
pub trait ObjectStore: Send + Sync {
    /// Bucket every object is written to.
    fn bucket(&self) -> &str;

    /// Open a write stream for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened.
    fn create(&self, key: &ObjectKey) -> io::Result<Box<dyn ObjectWriter>>;

    /// Human-readable address of `key`, naming both bucket and key.
    fn location(&self, key: &ObjectKey) -> String;
}

/// Stores objects as files under `{store_root}/{bucket}/{key}`.
///
/// Intended for buckets mounted into the local filesystem (FUSE, NFS, SMB).
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    store_root: PathBuf,
    bucket: String,
}

impl LocalObjectStore {
    /// Build a store rooted at `store_root` writing into `bucket`.
    #[must_use]
    pub fn new(store_root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            store_root: store_root.into(),
            bucket: bucket.into(),
        }
    }

    /// Filesystem path backing `key`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the key contains empty, `.` or `..` segments.
    pub fn object_path(&self, key: &ObjectKey) -> io::Result<PathBuf> {
        let mut path = self.store_root.join(&self.bucket);
        for segment in key.segments() {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "object key contains an empty or relative segment",
                ));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

impl ObjectStore for LocalObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn create(&self, key: &ObjectKey) -> io::Result<Box<dyn ObjectWriter>> {
        let destination = self.object_path(key)?;
        let parent = destination
            .parent()
            .map_or_else(|| self.store_root.clone(), Path::to_path_buf);
        fs::create_dir_all(&parent)?;

        let file_name = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial = parent.join(format!(".{file_name}.partial"));
        let file = File::create(&partial)?;
        debug!(partial = %partial.display(), "opened object stream");

        Ok(Box::new(LocalObjectWriter {
            file: Some(BufWriter::new(file)),
            partial,
            destination,
            committed: false,
        }))
    }

    fn location(&self, key: &ObjectKey) -> String {
        format!(
            "file://{}/{}/{}",
            self.store_root.display(),
            self.bucket,
            key
        )
    }
}

struct LocalObjectWriter {
    file: Option<BufWriter<File>>,
    partial: PathBuf,
    destination: PathBuf,
    committed: bool,
}

impl LocalObjectWriter {
    fn stream(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("object stream already closed"))
    }
}

impl Write for LocalObjectWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream()?.flush()
    }
}

impl ObjectWriter for LocalObjectWriter {
    fn commit(mut self: Box<Self>) -> io::Result<()> {
        let stream = self
            .file
            .take()
            .ok_or_else(|| io::Error::other("object stream already closed"))?;
        let file = stream.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.partial, &self.destination)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for LocalObjectWriter {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            if let Err(err) = fs::remove_file(&self.partial)
                && err.kind() != io::ErrorKind::NotFound
            {
                debug!(
                    partial = %self.partial.display(),
                    error = %err,
                    "failed to discard abandoned object stream"
                );
            }
        }
    }
}
