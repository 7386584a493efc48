//! Rate-limit backoff around a single announcement.
//!
//! # Design
//! - Sleep exactly the server-directed duration, then repeat the identical post.
//! - The default policy never gives up; a bounded policy converts exhaustion into an error.
//! - Sleeping goes through `Sleeper` so tests run without wall-clock delay.

use std::time::Duration;

use dumpsweep_config::RetryPolicy;
use tracing::{debug, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::notifier::{Delivery, Notifier};

/// Blocking sleep used between rate-limited attempts.
pub trait Sleeper: Send + Sync {
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Summary of a successful announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement {
    /// Total post attempts, including the successful one.
    pub attempts: u32,
    /// Attempts answered with a rate-limit signal.
    pub rate_limited: u32,
    /// Total time spent sleeping between attempts.
    pub waited: Duration,
}

/// Post `text` to `channel`, honouring rate-limit signals until it is accepted.
///
/// # Errors
///
/// Returns the notifier's error for any non-rate-limit failure, or
/// `NotifyError::RetryExhausted` when a bounded policy runs out of attempts.
pub fn announce(
    notifier: &dyn Notifier,
    sleeper: &dyn Sleeper,
    policy: RetryPolicy,
    channel: &str,
    text: &str,
) -> NotifyResult<Announcement> {
    let mut rate_limited: u32 = 0;
    let mut waited = Duration::ZERO;

    loop {
        match notifier.post(channel, text)? {
            Delivery::Posted => {
                debug!(channel, rate_limited, "announcement posted");
                return Ok(Announcement {
                    attempts: rate_limited.saturating_add(1),
                    rate_limited,
                    waited,
                });
            }
            Delivery::RateLimited(signal) => {
                rate_limited = rate_limited.saturating_add(1);
                if !policy.allows_retry_after(rate_limited) {
                    return Err(NotifyError::RetryExhausted {
                        attempts: rate_limited,
                        waited,
                    });
                }
                let retry_after_ms =
                    u64::try_from(signal.retry_after.as_millis()).unwrap_or(u64::MAX);
                warn!(
                    channel,
                    attempt = rate_limited,
                    retry_after_ms,
                    "rate limited, sleeping before retry"
                );
                sleeper.sleep(signal.retry_after);
                waited = waited.saturating_add(signal.retry_after);
            }
        }
    }
}
