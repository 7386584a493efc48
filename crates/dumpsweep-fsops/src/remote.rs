//! S3-compatible remote object store.
//!
//! # Design
//! - Serves `s3://` buckets and `gs://` buckets (GCS S3 interoperability, HMAC keys).
//! - Object bytes are spooled to a temp file and sent with one
//!   `PutObject` on `commit`, so memory stays bounded and nothing is visible
//!   remotely before commit.
//! - The sweep cycle is synchronous; SDK futures are driven on the daemon's
//!   runtime through a `Handle` from the blocking cycle thread.

use std::io::{self, BufWriter, Write};

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Region, RequestChecksumCalculation};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use dumpsweep_config::RemoteScheme;
use tempfile::NamedTempFile;
use tokio::runtime::Handle;
use tracing::debug;

use crate::model::ObjectKey;
use crate::store::{ObjectStore, ObjectWriter};

/// Connection settings for a remote bucket.
#[derive(Debug, Clone)]
pub struct RemoteStoreSettings {
    /// Provider selected by the store URL.
    pub scheme: RemoteScheme,
    /// Destination bucket.
    pub bucket: String,
    /// API endpoint override; defaults per provider.
    pub endpoint: Option<String>,
    /// Signing region override; defaults per provider, then the SDK chain.
    pub region: Option<String>,
}

/// Object store backed by an S3-compatible API.
#[derive(Clone)]
pub struct RemoteObjectStore {
    client: Client,
    bucket: String,
    scheme: RemoteScheme,
    runtime: Handle,
}

impl RemoteObjectStore {
    /// Wrap an already configured client.
    #[must_use]
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        scheme: RemoteScheme,
        runtime: Handle,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            scheme,
            runtime,
        }
    }

    /// Build a client from the ambient AWS configuration chain plus `settings`.
    ///
    /// Credentials come from the standard chain (`AWS_ACCESS_KEY_ID` and
    /// friends, profiles, instance metadata) and are resolved on first use.
    #[must_use]
    pub fn connect(settings: RemoteStoreSettings, runtime: Handle) -> Self {
        let endpoint = settings
            .endpoint
            .or_else(|| settings.scheme.default_endpoint().map(str::to_string));
        let region = settings
            .region
            .or_else(|| settings.scheme.default_region().map(str::to_string));

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = &endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = runtime.block_on(loader.load());

        let path_style = endpoint.is_some();
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();
        debug!(
            scheme = settings.scheme.as_str(),
            bucket = %settings.bucket,
            endpoint = endpoint.as_deref().unwrap_or("sdk-default"),
            "remote object store configured"
        );
        Self::new(
            Client::from_conf(config),
            settings.bucket,
            settings.scheme,
            runtime,
        )
    }
}

impl ObjectStore for RemoteObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn create(&self, key: &ObjectKey) -> io::Result<Box<dyn ObjectWriter>> {
        let spool = NamedTempFile::new()?;
        Ok(Box::new(RemoteObjectWriter {
            spool: Some(BufWriter::new(spool)),
            store: self.clone(),
            key: key.to_string(),
        }))
    }

    fn location(&self, key: &ObjectKey) -> String {
        format!("{}://{}/{}", self.scheme, self.bucket, key)
    }
}

struct RemoteObjectWriter {
    spool: Option<BufWriter<NamedTempFile>>,
    store: RemoteObjectStore,
    key: String,
}

impl RemoteObjectWriter {
    fn stream(&mut self) -> io::Result<&mut BufWriter<NamedTempFile>> {
        self.spool
            .as_mut()
            .ok_or_else(|| io::Error::other("object stream already closed"))
    }
}

impl Write for RemoteObjectWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream()?.flush()
    }
}

impl ObjectWriter for RemoteObjectWriter {
    fn commit(mut self: Box<Self>) -> io::Result<()> {
        let spool = self
            .spool
            .take()
            .ok_or_else(|| io::Error::other("object stream already closed"))?
            .into_inner()
            .map_err(io::IntoInnerError::into_error)?;
        let store = &self.store;

        let body = store
            .runtime
            .block_on(ByteStream::from_path(spool.path()))
            .map_err(|err| io::Error::other(err.to_string()))?;
        store
            .runtime
            .block_on(
                store
                    .client
                    .put_object()
                    .bucket(&store.bucket)
                    .key(&self.key)
                    .body(body)
                    .send(),
            )
            .map_err(|err| io::Error::other(DisplayErrorContext(&err).to_string()))?;

        debug!(bucket = %store.bucket, key = %self.key, "remote object committed");
        Ok(())
    }
}
