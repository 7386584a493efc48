//! Process-level tracing span.
//!
//! # Design
//! - Every log line emitted by the daemon carries the host identity and build SHA.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the process-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the `sweeper` span tagged with the given host identity.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("sweeper", host = %host, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}
