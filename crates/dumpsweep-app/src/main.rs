#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::cargo, clippy::nursery)]
#![allow(clippy::multiple_crate_versions)]

//! Binary entrypoint for the crash-dump sweeper daemon.

use std::process;

/// Runs the sweeper and exits with its status code.
fn main() {
    let code = dumpsweep_app::run();
    if code != 0 {
        process::exit(code);
    }
}
