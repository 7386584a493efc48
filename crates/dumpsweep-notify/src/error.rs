//! # Design
//!
//! - Rate limiting is not an error; it travels as `Delivery::RateLimited`.
//! - Keep error messages constant while carrying context fields for debugging.

use std::time::Duration;

use thiserror::Error;

/// Result alias for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors raised while posting an announcement.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP client could not be constructed.
    #[error("notification client construction failed")]
    Client {
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The configured API base URL could not be used.
    #[error("invalid notification endpoint")]
    Endpoint {
        /// URL that failed to parse or join.
        url: String,
        /// Underlying URL error.
        source: url::ParseError,
    },
    /// Transport-level failure talking to the notification service.
    #[error("notification request failed")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The service returned a non-success status other than rate limiting.
    #[error("notification response status error")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code returned by the service.
        status: u16,
    },
    /// The service accepted the request but reported an API error.
    #[error("notification service rejected the message")]
    Api {
        /// Operation identifier.
        operation: &'static str,
        /// Error code reported by the service.
        code: String,
    },
    /// The response body could not be decoded.
    #[error("notification response decode failed")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A bounded retry policy ran out of attempts while rate limited.
    #[error("notification retries exhausted")]
    RetryExhausted {
        /// Rate-limited responses received.
        attempts: u32,
        /// Total time spent sleeping before giving up.
        waited: Duration,
    },
}
