//! Local file to remote object streaming.
//!
//! # Design
//! - Three stages chained by `std::io::copy`: local reader, optional compressor, remote writer.
//! - Close order is fixed: compressor trailer first, then the remote commit, then the local handle.
//! - Any stage failure drops the remote writer uncommitted, so no partial object is published.

use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;

use dumpsweep_config::Compression;
use tracing::debug;

use crate::codec::Encoder;
use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{FileCandidate, ObjectKey};
use crate::store::ObjectStore;

/// Confirmation that an object was durably written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Key the object was written under.
    pub key: ObjectKey,
    /// Store-reported location (bucket and key).
    pub location: String,
    /// Bytes read from the local file (before compression).
    pub source_bytes: u64,
}

/// Streams candidates into the object store.
#[derive(Clone)]
pub struct TransferPipeline {
    store: Arc<dyn ObjectStore>,
    compression: Compression,
}

impl TransferPipeline {
    /// Build a pipeline writing into `store` with the given compression.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, compression: Compression) -> Self {
        Self { store, compression }
    }

    /// Upload `candidate` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `FsOpsError::Io` if the local file cannot be opened or read, and
    /// `FsOpsError::Store` if the object cannot be created, written, or committed.
    pub fn transfer(
        &self,
        candidate: &FileCandidate,
        key: &ObjectKey,
    ) -> FsOpsResult<TransferReceipt> {
        let file = File::open(&candidate.path)
            .map_err(|source| FsOpsError::io("transfer.open", &candidate.path, source))?;
        let mut reader = BufReader::new(file);

        let writer = self
            .store
            .create(key)
            .map_err(|source| FsOpsError::store("transfer.create", key, source))?;
        let mut encoder = Encoder::new(self.compression, writer);

        let source_bytes = copy_stream(&mut reader, &mut encoder, candidate, key)?;

        let writer = encoder
            .finish()
            .map_err(|source| FsOpsError::store("transfer.finish_compressor", key, source))?;
        writer
            .commit()
            .map_err(|source| FsOpsError::store("transfer.commit", key, source))?;
        drop(reader);

        debug!(key = %key, source_bytes, "object committed");
        Ok(TransferReceipt {
            key: key.clone(),
            location: self.store.location(key),
            source_bytes,
        })
    }
}

fn copy_stream(
    reader: &mut BufReader<File>,
    encoder: &mut Encoder,
    candidate: &FileCandidate,
    key: &ObjectKey,
) -> FsOpsResult<u64> {
    let mut tracked = ReadTracker {
        inner: reader,
        read_failed: false,
    };
    io::copy(&mut tracked, encoder).map_err(|source| {
        if tracked.read_failed {
            FsOpsError::io("transfer.read", &candidate.path, source)
        } else {
            FsOpsError::store("transfer.copy", key, source)
        }
    })
}

/// Records whether an `io::copy` failure originated on the read side.
struct ReadTracker<'a, R> {
    inner: &'a mut R,
    read_failed: bool,
}

impl<R: io::Read> io::Read for ReadTracker<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).inspect_err(|_| {
            self.read_failed = true;
        })
    }
}
