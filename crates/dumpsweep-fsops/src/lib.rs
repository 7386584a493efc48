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

//! Filesystem sweep pipeline: find aged artifacts, ship them to object
//! storage, announce them, and reclaim local disk.
//!
//! Layout: `scan.rs` (directory walk), `age.rs` (eligibility cutoff),
//! `naming.rs` (object keys), `codec.rs` (streaming compression), `store.rs`
//! (object-store port and local backend), `remote.rs` (S3-compatible backend),
//! `transfer.rs` (upload pipeline), `remove.rs` (local deletion), `sweep.rs`
//! (one full cycle), `model/`.

pub mod age;
pub mod codec;
pub mod error;
pub mod model;
pub mod naming;
pub mod remote;
pub mod remove;
pub mod scan;
pub mod store;
pub mod sweep;
pub mod transfer;

pub use age::{AgeFilter, Eligibility};
pub use error::{FsOpsError, FsOpsResult};
pub use model::{FileCandidate, ObjectKey};
pub use naming::KeyNamer;
pub use remote::{RemoteObjectStore, RemoteStoreSettings};
pub use remove::{FileRemover, FsRemover};
pub use scan::{Scanner, Visit};
pub use store::{LocalObjectStore, ObjectStore, ObjectWriter};
pub use sweep::{CycleOutcome, CycleReport, Sweeper, SweeperDeps, UploadedObject};
pub use transfer::{TransferPipeline, TransferReceipt};
