//! Aggregate pass/fail/skip counts.
//!
//! Statistics are accumulated once per completed module and merged into a process-wide total by whoever
//! drives the runs. Every recorded call bumps exactly one of `ok`, `ko` or `skipped`, and always `total`.

use std::fmt;
use std::ops::AddAssign;

/// Counts for one run, one module, or a whole session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunStatistics {
    pub ok: usize,
    pub ko: usize,
    pub skipped: usize,
    pub total: usize,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ok(&mut self) {
        self.ok += 1;
        self.total += 1;
    }

    pub fn record_ko(&mut self) {
        self.ko += 1;
        self.total += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
        self.total += 1;
    }

    /// Fold another set of counts into this one.
    pub fn merge(&mut self, other: &RunStatistics) {
        self.ok += other.ok;
        self.ko += other.ko;
        self.skipped += other.skipped;
        self.total += other.total;
    }

    /// No call failed, was cancelled, or was left unexecuted.
    pub fn is_success(&self) -> bool {
        self.ko == 0
    }
}

impl AddAssign for RunStatistics {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ok, {} ko, {} skipped ({} total)",
            self.ok, self.ko, self.skipped, self.total
        )
    }
}
