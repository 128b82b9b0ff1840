//! The test-call registry and its registration builder.

use std::error::Error;
use std::fmt::Debug;
use std::future::Future;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use super::call::{self, CallInfo, Expected, Failure, FailureKind, SameFailure, TestCall};

/// An operation was attempted in a registry phase that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Diagnostic)]
pub enum InvalidState {
    #[error("a run is already in progress on this registry")]
    #[diagnostic(code(ordeal::engine::run_in_progress))]
    RunInProgress,

    #[error("registration is closed")]
    #[diagnostic(
        code(ordeal::engine::registration_closed),
        help("reset the registry after a run before registering new calls")
    )]
    RegistrationClosed,

    #[error("cannot reset the registry while a run is in progress")]
    #[diagnostic(code(ordeal::engine::reset_during_run))]
    ResetDuringRun,
}

/// A registration with an explicit timeout was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Diagnostic)]
pub enum RegistrationError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Closed(#[from] InvalidState),

    #[error("a test call timeout must be greater than zero")]
    #[diagnostic(code(ordeal::engine::zero_timeout))]
    ZeroTimeout,
}

/// Lifecycle of a registry: `Registering -> Running -> Drained -> (reset) -> Registering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Registering,
    Running,
    Drained,
}

#[derive(Default)]
struct RegistryState {
    pending: Vec<TestCall>,
    phase: Phase,
}

/// Ordered list of pending test calls.
///
/// A registry is shared by reference between registration code and the engine; the engine drains it when a
/// run starts. Registration is only accepted in the [`Phase::Registering`] phase.
#[derive(Default)]
pub struct TestRegistry {
    state: Mutex<RegistryState>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start registering a call of `f` with `args`, timed by the engine's default timeout.
    ///
    /// Nothing is registered until the returned [`Specifier`] is finalised with an expectation.
    pub fn register<F, A>(&self, f: F, args: A) -> Result<Specifier<'_, F, A>, InvalidState> {
        self.ensure_registering()?;
        Ok(Specifier::new(self, f, args, None))
    }

    /// Like [`TestRegistry::register`], with an explicit timeout for this call.
    ///
    /// Calls registered this way are the ones `skip_timeboxed_tests` skips. A zero timeout is refused: it
    /// would cancel the call at its first suspension and abandon the rest of the run.
    pub fn register_with_timeout<F, A>(
        &self,
        f: F,
        args: A,
        timeout: Duration,
    ) -> Result<Specifier<'_, F, A>, RegistrationError> {
        self.ensure_registering()?;
        if timeout.is_zero() {
            return Err(RegistrationError::ZeroTimeout);
        }
        Ok(Specifier::new(self, f, args, Some(timeout)))
    }

    /// Discard pending calls and reopen registration.
    pub fn reset(&self) -> Result<(), InvalidState> {
        let mut state = self.state();
        if state.phase == Phase::Running {
            return Err(InvalidState::ResetDuringRun);
        }
        state.pending.clear();
        state.phase = Phase::Registering;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// Number of calls registered and not yet drained by a run.
    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    /// Enter the running phase and take the pending calls, in registration order.
    pub(crate) fn begin_run(&self) -> Result<(RunGuard<'_>, Vec<TestCall>), InvalidState> {
        let mut state = self.state();
        if state.phase == Phase::Running {
            return Err(InvalidState::RunInProgress);
        }
        state.phase = Phase::Running;
        let calls = mem::take(&mut state.pending);
        Ok((RunGuard { registry: self }, calls))
    }

    fn ensure_registering(&self) -> Result<(), InvalidState> {
        match self.state().phase {
            Phase::Registering => Ok(()),
            Phase::Running | Phase::Drained => Err(InvalidState::RegistrationClosed),
        }
    }

    fn append(&self, call: TestCall) {
        let mut state = self.state();
        if state.phase != Phase::Registering {
            tracing::warn!(
                call = %call.info,
                phase = ?state.phase,
                "registration closed before the call was finalised; dropping it"
            );
            return;
        }
        tracing::trace!(call = %call.info, "registered test call");
        state.pending.push(call);
    }

    // A panic while holding the lock can't leave the state half-updated: every critical section is a
    // single assignment or push.
    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for TestRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("TestRegistry")
            .field("phase", &state.phase)
            .field("pending", &state.pending.len())
            .finish()
    }
}

/// Marks the registry drained when a run ends, including when the run future is dropped early.
pub(crate) struct RunGuard<'r> {
    registry: &'r TestRegistry,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.registry.state().phase = Phase::Drained;
    }
}

/// Builder returned by [`TestRegistry::register`]; finalise it with one expectation.
///
/// ```
/// use ordeal::engine::TestRegistry;
///
/// async fn double(x: i32) -> Result<i32, String> {
///     Ok(x * 2)
/// }
///
/// let registry = TestRegistry::new();
/// registry.register(double, 21).unwrap().equals(42);
/// ```
#[must_use = "a call is only registered once an expectation is set"]
pub struct Specifier<'r, F, A> {
    registry: &'r TestRegistry,
    f: F,
    args: A,
    label: String,
    timeout: Option<Duration>,
}

impl<'r, F, A> Specifier<'r, F, A> {
    fn new(registry: &'r TestRegistry, f: F, args: A, timeout: Option<Duration>) -> Self {
        Self {
            registry,
            f,
            args,
            label: call::fn_label::<F>(),
            timeout,
        }
    }

    /// Override the label derived from the function's type name.
    pub fn named(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl<F, A, Fut, V, E> Specifier<'_, F, A>
where
    F: FnOnce(A) -> Fut + Send + 'static,
    A: Debug + Send + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    V: PartialEq + Debug + Send + 'static,
    E: Into<Failure> + Send + 'static,
{
    /// Expect the call to return a value equal to `expected`.
    pub fn equals(self, expected: V) {
        self.finish(Expected::Value(expected));
    }

    /// Expect the call to fail with an error equal to `expected`.
    pub fn throws<X>(self, expected: X)
    where
        X: Error + PartialEq + Send + Sync + 'static,
    {
        self.finish(Expected::Failure(Box::new(SameFailure(expected))));
    }

    /// Expect the call to fail with any error of type `X`.
    pub fn throws_kind<X>(self)
    where
        X: Error + Send + Sync + 'static,
    {
        self.finish(Expected::Failure(Box::new(FailureKind::<X>::new())));
    }

    fn finish(self, expected: Expected<V>) {
        let Specifier {
            registry,
            f,
            args,
            label,
            timeout,
        } = self;
        let info = CallInfo {
            label,
            args: format!("{args:?}"),
            timeout,
        };
        let expectation = expected.describe();
        registry.append(TestCall {
            info,
            expected: expectation,
            invoke: call::invocation(f, args, expected),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn identity(x: u32) -> Result<u32, String> {
        Ok(x)
    }

    #[test]
    fn test_registration_appends_in_order() {
        let registry = TestRegistry::new();
        registry.register(identity, 1).unwrap().equals(1);
        registry.register(identity, 2).unwrap().named("second").equals(2);
        assert_eq!(registry.pending_len(), 2);

        let (_guard, calls) = registry.begin_run().unwrap();
        let labels: Vec<_> = calls.iter().map(|call| call.info.to_string()).collect();
        assert_eq!(labels, ["identity(1)", "second(2)"]);
    }

    #[test]
    fn test_specifier_dropped_without_expectation_registers_nothing() {
        let registry = TestRegistry::new();
        let _ = registry.register(identity, 1).unwrap();
        assert_eq!(registry.pending_len(), 0);
    }

    #[test]
    fn test_phase_transitions() {
        let registry = TestRegistry::new();
        assert_eq!(registry.phase(), Phase::Registering);

        let (guard, _) = registry.begin_run().unwrap();
        assert!(registry.is_running());
        assert_eq!(registry.begin_run().err(), Some(InvalidState::RunInProgress));
        assert_eq!(registry.reset(), Err(InvalidState::ResetDuringRun));
        assert_eq!(
            registry.register(identity, 1).err().map(|e| e.to_string()),
            Some("registration is closed".to_string())
        );
        drop(guard);

        assert_eq!(registry.phase(), Phase::Drained);
        assert!(registry.register(identity, 1).is_err());
        registry.reset().unwrap();
        assert_eq!(registry.phase(), Phase::Registering);
        assert!(registry.register(identity, 1).is_ok());
    }

    #[test]
    fn test_specifier_finalised_after_run_started_is_dropped() {
        let registry = TestRegistry::new();
        let specifier = registry.register(identity, 1).unwrap();
        let (_guard, calls) = registry.begin_run().unwrap();
        assert!(calls.is_empty());
        specifier.equals(1);
        assert_eq!(registry.pending_len(), 0);
    }

    #[test]
    fn test_reset_discards_pending_calls() {
        let registry = TestRegistry::new();
        registry.register(identity, 1).unwrap().equals(1);
        registry.reset().unwrap();
        assert_eq!(registry.pending_len(), 0);
    }

    #[test]
    fn test_timeout_override_is_recorded() {
        let registry = TestRegistry::new();
        registry
            .register_with_timeout(identity, 1, Duration::from_millis(5))
            .unwrap()
            .equals(1);
        let (_guard, calls) = registry.begin_run().unwrap();
        assert_eq!(calls[0].info.timeout, Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_zero_timeout_is_refused() {
        let registry = TestRegistry::new();
        assert_eq!(
            registry.register_with_timeout(identity, 1, Duration::ZERO).err(),
            Some(RegistrationError::ZeroTimeout)
        );
        assert_eq!(registry.pending_len(), 0);

        let (_guard, _) = registry.begin_run().unwrap();
        assert_eq!(
            registry.register_with_timeout(identity, 1, Duration::ZERO).err(),
            Some(RegistrationError::Closed(InvalidState::RegistrationClosed))
        );
    }
}
