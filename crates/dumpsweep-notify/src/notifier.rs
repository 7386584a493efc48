//! The notification port consumed by the sweep cycle.

use std::time::Duration;

use crate::error::NotifyResult;

/// Server-directed wait before a rate-limited post may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSignal {
    /// How long the service asked the caller to wait.
    pub retry_after: Duration,
}

/// Outcome of a single post attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message was accepted.
    Posted,
    /// The service refused the message for now; retry after the signalled wait.
    RateLimited(RateLimitSignal),
}

/// Posts human-readable text to a channel.
pub trait Notifier: Send + Sync {
    /// Attempt to post `text` to `channel` exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than rate limiting.
    fn post(&self, channel: &str, text: &str) -> NotifyResult<Delivery>;
}
