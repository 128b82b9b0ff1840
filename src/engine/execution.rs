//! Per-call execution records and run tallies.

use std::time::Duration;

use ordeal_core::RunStatistics;
use thiserror::Error;

use super::call::{CallInfo, Expectation, Outcome};

/// Why a call was cancelled. A cancellation aborts the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Cancellation {
    #[error("timed out after {timeout:?}")]
    TimedOut { timeout: Duration },

    /// The engine failed while finalising the call.
    #[error("engine defect: {message}")]
    Defect { message: String },
}

/// Lifecycle of one test call within a run.
///
/// Every record starts [`TestCallExecution::Initialized`] and is settled at most once. A record still
/// `Initialized` after the run belongs to a call that was never started because an earlier call was
/// cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TestCallExecution {
    #[default]
    Initialized,
    Cancelled(Cancellation),
    Skipped,
    Done {
        passed: bool,
        obtained: Outcome,
        expected: Expectation,
    },
}

impl TestCallExecution {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestCallExecution::Done { passed: true, .. })
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, TestCallExecution::Initialized)
    }

    /// Upper-case status word used in reports.
    pub fn status(&self) -> &'static str {
        match self {
            TestCallExecution::Initialized => "NOT RUN",
            TestCallExecution::Cancelled(_) => "CANCELLED",
            TestCallExecution::Skipped => "SKIPPED",
            TestCallExecution::Done { passed: true, .. } => "PASSED",
            TestCallExecution::Done { passed: false, .. } => "FAILED",
        }
    }
}

/// One registered call and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub call: CallInfo,
    pub execution: TestCallExecution,
}

impl ExecutionRecord {
    pub(crate) fn new(call: CallInfo) -> Self {
        Self {
            call,
            execution: TestCallExecution::Initialized,
        }
    }

    pub(crate) fn settle(&mut self, execution: TestCallExecution) {
        debug_assert!(!self.execution.is_settled(), "execution record settled twice: {}", self.call);
        self.execution = execution;
    }
}

/// Count a run's records: passed calls are ok, skipped calls are skipped, everything else is ko.
pub fn tally(records: &[ExecutionRecord]) -> RunStatistics {
    let mut stats = RunStatistics::default();
    for record in records {
        match &record.execution {
            execution if execution.is_passed() => stats.record_ok(),
            TestCallExecution::Skipped => stats.record_skipped(),
            _ => stats.record_ko(),
        }
    }
    stats
}
