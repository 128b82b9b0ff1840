//! The sequential engine.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use super::call::{Expectation, Finalize, TestCall, panic_message};
use super::execution::{Cancellation, ExecutionRecord, TestCallExecution};
use super::registry::{InvalidState, TestRegistry};

/// Time allowed to a call registered without an explicit timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip every call registered with an explicit timeout.
    pub skip_timeboxed_tests: bool,
}

impl RunOptions {
    pub fn skipping_timeboxed_tests() -> Self {
        Self {
            skip_timeboxed_tests: true,
        }
    }
}

/// Executes a registry's calls one at a time, in registration order.
///
/// Each call races its timeout. When the timer wins the call is cancelled and the rest of the run is
/// abandoned: remaining records stay [`TestCallExecution::Initialized`]. A call that completes after its
/// timer fired is never observed.
///
/// Abandoning the whole run on one timeout, rather than only the late call, is deliberate compatibility
/// behaviour and may change to per-call cancellation.
///
/// Preemption only happens at `.await` points. A call that blocks the thread (a synchronous function that
/// loops, for example) can't be interrupted by its timer.
#[derive(Debug, Clone)]
pub struct Engine {
    default_timeout: Duration,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Drain `registry` and execute its calls.
    ///
    /// Returns one record per drained call, in registration order. Fails without touching the registry if
    /// a run is already in progress on it. Once this returns (or the future is dropped) the registry is
    /// drained and must be reset before new calls can be registered.
    #[tracing::instrument(skip_all, fields(skip_timeboxed = options.skip_timeboxed_tests))]
    pub async fn run(
        &self,
        registry: &TestRegistry,
        options: RunOptions,
    ) -> Result<Vec<ExecutionRecord>, InvalidState> {
        let (_guard, calls) = registry.begin_run()?;
        tracing::debug!(calls = calls.len(), "run started");

        let mut records: Vec<ExecutionRecord> = calls
            .iter()
            .map(|call| ExecutionRecord::new(call.info.clone()))
            .collect();

        for (index, call) in calls.into_iter().enumerate() {
            let TestCall { info, expected, invoke } = call;

            if options.skip_timeboxed_tests && info.timeout.is_some() {
                tracing::debug!(call = %info, "skipping timeboxed call");
                records[index].settle(TestCallExecution::Skipped);
                continue;
            }

            let timeout = info.timeout.unwrap_or(self.default_timeout);
            tracing::debug!(call = %info, ?timeout, "starting call");
            let execution = match tokio::time::timeout(timeout, invoke()).await {
                Ok(settled) => finalize(settled, expected),
                Err(_elapsed) => TestCallExecution::Cancelled(Cancellation::TimedOut { timeout }),
            };

            if let TestCallExecution::Cancelled(cancellation) = &execution {
                tracing::warn!(
                    call = %info,
                    reason = %cancellation,
                    abandoned = records.len() - index - 1,
                    "call cancelled, abandoning the rest of the run"
                );
                records[index].settle(execution);
                break;
            }

            tracing::debug!(call = %info, status = execution.status(), "call finished");
            records[index].settle(execution);
            // Let other tasks on the runtime make progress between calls.
            tokio::task::yield_now().await;
        }

        Ok(records)
    }
}

/// Compare a settled call against its expectation. A panic here is an engine defect, not a test failure.
fn finalize(settled: Box<dyn Finalize>, expected: Expectation) -> TestCallExecution {
    match panic::catch_unwind(AssertUnwindSafe(move || settled.finalize())) {
        Ok(verdict) => TestCallExecution::Done {
            passed: verdict.passed,
            obtained: verdict.obtained,
            expected,
        },
        Err(payload) => TestCallExecution::Cancelled(Cancellation::Defect {
            message: panic_message(payload.as_ref()),
        }),
    }
}
