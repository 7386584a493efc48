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

//! Crash-dump sweeper bootstrap wiring.
//!
//! Layout: `cli.rs` (flags and environment), `bootstrap.rs` (collaborator
//! construction and exit codes), `scheduler.rs` (tick loop), `error.rs`.

/// Command-line and environment surface.
pub mod cli;
/// Process bootstrap and exit-code policy.
pub mod bootstrap;
/// Application error type.
pub mod error;
/// Fixed-interval sweep scheduling.
pub mod scheduler;

pub use bootstrap::{Daemon, run, run_with};
pub use cli::Cli;
pub use error::{AppError, AppResult};
pub use scheduler::{CycleRunner, Scheduler, shutdown_signal};
