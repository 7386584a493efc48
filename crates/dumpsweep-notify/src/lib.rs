#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Upload announcements for the sweep pipeline.
//!
//! Layout: `notifier.rs` (the `Notifier` port and delivery outcome),
//! `slack.rs` (Slack Web API adapter), `retry.rs` (rate-limit backoff loop),
//! `message.rs` (announcement text), `error.rs`.

pub mod error;
pub mod message;
pub mod notifier;
pub mod retry;
pub mod slack;

pub use error::{NotifyError, NotifyResult};
pub use message::announcement_text;
pub use notifier::{Delivery, Notifier, RateLimitSignal};
pub use retry::{Announcement, Sleeper, ThreadSleeper, announce};
pub use slack::{DEFAULT_SLACK_API_URL, SlackNotifier};
