//! Scripted fakes for the sweep ports.
//!
//! Every fake records what it was asked to do so suites can assert on ordering
//! and counts without touching external services.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dumpsweep_fsops::{FileRemover, ObjectKey, ObjectStore, ObjectWriter};
use dumpsweep_notify::{Delivery, Notifier, NotifyError, NotifyResult, RateLimitSignal, Sleeper};

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Step at which `MemoryObjectStore` should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    /// Opening the stream fails.
    Create,
    /// The first write on the stream fails.
    Write,
    /// Committing the stream fails.
    Commit,
}

type Objects = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

/// In-memory object store with optional failure injection.
#[derive(Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: Objects,
    commits: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<StoreFailure>>>,
}

impl MemoryObjectStore {
    /// Empty store for `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::default(),
            commits: Arc::default(),
            failure: Arc::default(),
        }
    }

    /// Fail every subsequent transfer at `stage`; `None` clears the failure.
    pub fn fail_at(&self, stage: Option<StoreFailure>) {
        *guard(&self.failure) = stage;
    }

    /// Committed object bytes for `key`.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        guard(&self.objects).get(key).cloned()
    }

    /// Keys of committed objects in lexical order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        guard(&self.objects).keys().cloned().collect()
    }

    /// Every successful commit in order, including overwrites.
    #[must_use]
    pub fn commits(&self) -> Vec<String> {
        guard(&self.commits).clone()
    }

    fn failure(&self) -> Option<StoreFailure> {
        *guard(&self.failure)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn create(&self, key: &ObjectKey) -> io::Result<Box<dyn ObjectWriter>> {
        if self.failure() == Some(StoreFailure::Create) {
            return Err(io::Error::other("injected create failure"));
        }
        Ok(Box::new(MemoryWriter {
            key: key.to_string(),
            buffer: Vec::new(),
            failure: self.failure(),
            objects: Arc::clone(&self.objects),
            commits: Arc::clone(&self.commits),
        }))
    }

    fn location(&self, key: &ObjectKey) -> String {
        format!("mem://{}/{}", self.bucket, key)
    }
}

struct MemoryWriter {
    key: String,
    buffer: Vec<u8>,
    failure: Option<StoreFailure>,
    objects: Objects,
    commits: Arc<Mutex<Vec<String>>>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failure == Some(StoreFailure::Write) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected write failure"));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ObjectWriter for MemoryWriter {
    fn commit(self: Box<Self>) -> io::Result<()> {
        if self.failure == Some(StoreFailure::Commit) {
            return Err(io::Error::other("injected commit failure"));
        }
        let Self {
            key,
            buffer,
            objects,
            commits,
            ..
        } = *self;
        guard(&objects).insert(key.clone(), buffer);
        guard(&commits).push(key);
        Ok(())
    }
}

/// A post observed by `RecordingNotifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Channel the post targeted.
    pub channel: String,
    /// Message text.
    pub text: String,
}

/// Notifier that replays scripted replies and records every post.
///
/// Once the script is exhausted every post is accepted.
#[derive(Default)]
pub struct RecordingNotifier {
    replies: Mutex<VecDeque<NotifyResult<Delivery>>>,
    posts: Mutex<Vec<Post>>,
}

impl RecordingNotifier {
    /// Notifier that accepts every post.
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Notifier answering with `replies` in order.
    #[must_use]
    pub fn scripted(replies: Vec<NotifyResult<Delivery>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            posts: Mutex::default(),
        }
    }

    /// Queue a rate-limit reply asking for `retry_after`.
    pub fn push_rate_limit(&self, retry_after: Duration) {
        guard(&self.replies).push_back(Ok(Delivery::RateLimited(RateLimitSignal { retry_after })));
    }

    /// Queue a non-rate-limit failure.
    pub fn push_failure(&self, status: u16) {
        guard(&self.replies).push_back(Err(NotifyError::Status {
            operation: "chat.post_message",
            status,
        }));
    }

    /// Every post attempted so far, including rate-limited ones.
    #[must_use]
    pub fn posts(&self) -> Vec<Post> {
        guard(&self.posts).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn post(&self, channel: &str, text: &str) -> NotifyResult<Delivery> {
        guard(&self.posts).push(Post {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        guard(&self.replies)
            .pop_front()
            .unwrap_or(Ok(Delivery::Posted))
    }
}

/// Sleeper that records requested durations without blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Durations requested so far.
    #[must_use]
    pub fn slept(&self) -> Vec<Duration> {
        guard(&self.slept).clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        guard(&self.slept).push(duration);
    }
}

/// Remover that fails a fixed number of times before deleting for real.
#[derive(Default)]
pub struct FailingRemover {
    remaining_failures: Mutex<u32>,
    attempts: Mutex<Vec<PathBuf>>,
}

impl FailingRemover {
    /// Fail the next `failures` removals with `PermissionDenied`.
    #[must_use]
    pub fn failing(failures: u32) -> Self {
        Self {
            remaining_failures: Mutex::new(failures),
            attempts: Mutex::default(),
        }
    }

    /// Paths removal was attempted on, in order.
    #[must_use]
    pub fn attempts(&self) -> Vec<PathBuf> {
        guard(&self.attempts).clone()
    }
}

impl FileRemover for FailingRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        guard(&self.attempts).push(path.to_path_buf());
        let mut remaining = guard(&self.remaining_failures);
        if *remaining > 0 {
            *remaining -= 1;
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "injected removal failure",
            ));
        }
        drop(remaining);
        fs::remove_file(path)
    }
}
