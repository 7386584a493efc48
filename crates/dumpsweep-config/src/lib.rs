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

//! Immutable configuration for the dumpsweep daemon.
//!
//! Layout: `model.rs` (typed configuration values), `validate.rs` (settings
//! validation and duration parsing), `defaults.rs` (process defaults),
//! `error.rs` (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{
    Compression, FailurePolicy, NamingStrategy, RemoteScheme, RetryPolicy, SlackToken,
    StoreTarget, SweepConfig, SweepSettings,
};
pub use validate::{build_config, parse_duration, parse_store_target, require_token};
