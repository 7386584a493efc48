//! Eligibility gate based on modification age.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::FileCandidate;

/// Whether a candidate may enter the transfer pipeline this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Modified at or before the cutoff.
    Eligible,
    /// Modified after the cutoff; re-evaluated next cycle.
    TooNew,
}

/// Compares candidate modification times against `cycle start - min age`.
#[derive(Debug, Clone, Copy)]
pub struct AgeFilter {
    cutoff: DateTime<Utc>,
}

impl AgeFilter {
    /// Build the filter for a cycle that started at `started_at`.
    #[must_use]
    pub fn new(started_at: DateTime<Utc>, min_age: Duration) -> Self {
        let cutoff = TimeDelta::from_std(min_age)
            .ok()
            .and_then(|age| started_at.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { cutoff }
    }

    /// Newest modification time that is still eligible.
    #[must_use]
    pub const fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Judge a candidate against the cutoff.
    #[must_use]
    pub fn evaluate(&self, candidate: &FileCandidate) -> Eligibility {
        if candidate.modified > self.cutoff {
            Eligibility::TooNew
        } else {
            Eligibility::Eligible
        }
    }
}
