//! Test calls: what gets invoked, what it is expected to produce, and how the two are compared.
//!
//! A registered function is type-erased into an [`Invocation`]: a one-shot closure returning a boxed future
//! that settles into a [`Finalize`] value. The comparison against the expectation happens later, in
//! [`Finalize::finalize`], so the engine can decide whether a settled call is honoured (it may have lost
//! the race against its timer) and can catch a comparison that itself panics.

use std::any::{Any, type_name};
use std::error::Error;
use std::fmt;
use std::future::{Future, Ready};
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;

/// The failure channel: every error a tested function returns, and every panic it raises.
pub type Failure = Box<dyn Error + Send + Sync + 'static>;

/// A panic raised by a tested function, normalised into the failure channel.
///
/// Expect one with `throws_kind::<Panicked>()` or `throws(Panicked::new("message"))`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("panicked: {message}")]
pub struct Panicked {
    pub message: String,
}

impl Panicked {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build from a payload caught with `catch_unwind`.
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        Self::new(panic_message(payload))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Rendered outcomes (what records and reports carry)
// ============================================================================

/// What a call actually produced, rendered with `Debug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Value(String),
    Error(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => write!(f, "returned {value}"),
            Outcome::Error(error) => write!(f, "failed with {error}"),
        }
    }
}

/// What a call was expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// A value equal to this one.
    Value(String),
    /// An error equal to this one.
    Error(String),
    /// Any error of this type.
    ErrorKind(&'static str),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Value(value) => write!(f, "to return {value}"),
            Expectation::Error(error) => write!(f, "to fail with {error}"),
            Expectation::ErrorKind(kind) => write!(f, "to fail with any {kind}"),
        }
    }
}

/// Identity of a registered call, kept on its execution record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    pub label: String,
    /// The captured arguments, rendered with `Debug`.
    pub args: String,
    /// Explicit timeout override, if the call was registered with one.
    pub timeout: Option<Duration>,
}

impl fmt::Display for CallInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.starts_with('(') {
            write!(f, "{}{}", self.label, self.args)
        } else {
            write!(f, "{}({})", self.label, self.args)
        }
    }
}

/// Short label for a function type: the last path segment, or the full name for closures.
pub(crate) fn fn_label<F>() -> String {
    let full = type_name::<F>();
    match full.rsplit_once("::") {
        Some((_, last)) if !last.starts_with('{') => last.to_string(),
        _ => full.to_string(),
    }
}

// ============================================================================
// Type-erased calls
// ============================================================================

pub(crate) struct Verdict {
    pub(crate) passed: bool,
    pub(crate) obtained: Outcome,
}

/// A settled call waiting to be compared against its expectation.
pub(crate) trait Finalize: Send {
    fn finalize(self: Box<Self>) -> Verdict;
}

pub(crate) type Invocation = Box<dyn FnOnce() -> BoxFuture<'static, Box<dyn Finalize>> + Send>;

/// A registered test intent. Immutable once created; consumed by the run that executes it.
pub(crate) struct TestCall {
    pub(crate) info: CallInfo,
    pub(crate) expected: Expectation,
    pub(crate) invoke: Invocation,
}

/// Decides whether a failure is the expected one.
pub(crate) trait FailureMatcher: Send {
    fn matches(&self, failure: &Failure) -> bool;
    fn describe(&self) -> Expectation;
}

/// Matches a failure that downcasts to `E` and compares equal to the stored instance.
pub(crate) struct SameFailure<E>(pub(crate) E);

impl<E> FailureMatcher for SameFailure<E>
where
    E: Error + PartialEq + Send + Sync + 'static,
{
    fn matches(&self, failure: &Failure) -> bool {
        failure.downcast_ref::<E>().is_some_and(|error| *error == self.0)
    }

    fn describe(&self) -> Expectation {
        Expectation::Error(format!("{:?}", self.0))
    }
}

/// Matches any failure whose concrete type is `E`.
pub(crate) struct FailureKind<E>(PhantomData<fn() -> E>);

impl<E> FailureKind<E> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> FailureMatcher for FailureKind<E>
where
    E: Error + Send + Sync + 'static,
{
    fn matches(&self, failure: &Failure) -> bool {
        failure.is::<E>()
    }

    fn describe(&self) -> Expectation {
        Expectation::ErrorKind(type_name::<E>())
    }
}

pub(crate) enum Expected<V> {
    Value(V),
    Failure(Box<dyn FailureMatcher>),
}

impl<V: fmt::Debug> Expected<V> {
    pub(crate) fn describe(&self) -> Expectation {
        match self {
            Expected::Value(value) => Expectation::Value(format!("{value:?}")),
            Expected::Failure(matcher) => matcher.describe(),
        }
    }
}

struct Settled<V> {
    result: Result<V, Failure>,
    expected: Expected<V>,
}

impl<V> Finalize for Settled<V>
where
    V: PartialEq + fmt::Debug + Send,
{
    fn finalize(self: Box<Self>) -> Verdict {
        let Settled { result, expected } = *self;
        match result {
            Ok(value) => Verdict {
                passed: matches!(&expected, Expected::Value(wanted) if *wanted == value),
                obtained: Outcome::Value(format!("{value:?}")),
            },
            Err(failure) => Verdict {
                passed: matches!(&expected, Expected::Failure(matcher) if matcher.matches(&failure)),
                obtained: Outcome::Error(format!("{failure:?}")),
            },
        }
    }
}

/// Erase a typed function, its arguments and its expectation into an [`Invocation`].
///
/// The function is called inside the returned future, so a panic raised while calling it and a panic
/// raised while polling its future land in the same place.
pub(crate) fn invocation<F, A, Fut, V, E>(f: F, args: A, expected: Expected<V>) -> Invocation
where
    F: FnOnce(A) -> Fut + Send + 'static,
    A: Send + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    V: PartialEq + fmt::Debug + Send + 'static,
    E: Into<Failure> + Send + 'static,
{
    Box::new(move || {
        async move {
            let settled = AssertUnwindSafe(async move { f(args).await }).catch_unwind().await;
            let result = match settled {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => Err(error.into()),
                Err(payload) => Err(Box::new(Panicked::from_payload(payload.as_ref())) as Failure),
            };
            Box::new(Settled { result, expected }) as Box<dyn Finalize>
        }
        .boxed()
    })
}

/// Adapt a synchronous function for registration.
///
/// ```
/// use ordeal::engine::{TestRegistry, sync_fn};
///
/// fn checked_div((a, b): (i32, i32)) -> Result<i32, String> {
///     a.checked_div(b).ok_or_else(|| "division by zero".to_string())
/// }
///
/// let registry = TestRegistry::new();
/// registry.register(sync_fn(checked_div), (6, 3)).unwrap().named("checked_div").equals(2);
/// assert_eq!(registry.pending_len(), 1);
/// ```
pub fn sync_fn<F, A, V, E>(f: F) -> impl FnOnce(A) -> Ready<Result<V, E>>
where
    F: FnOnce(A) -> Result<V, E>,
{
    move |args| std::future::ready(f(args))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Error)]
    #[error("bad input: {0}")]
    struct BadInput(String);

    #[derive(Debug, Error)]
    #[error("other")]
    struct Other;

    fn settle<V>(result: Result<V, Failure>, expected: Expected<V>) -> Verdict
    where
        V: PartialEq + fmt::Debug + Send + 'static,
    {
        Box::new(Settled { result, expected }).finalize()
    }

    #[test]
    fn test_value_equality() {
        let verdict = settle(Ok(vec![1, 2]), Expected::Value(vec![1, 2]));
        assert!(verdict.passed);
        assert_eq!(verdict.obtained, Outcome::Value("[1, 2]".to_string()));

        assert!(!settle(Ok(3), Expected::Value(4)).passed);
    }

    #[test]
    fn test_value_never_satisfies_error_expectation() {
        let verdict = settle(Ok(1), Expected::Failure(Box::new(FailureKind::<BadInput>::new())));
        assert!(!verdict.passed);
    }

    #[test]
    fn test_error_never_satisfies_value_expectation() {
        let verdict = settle::<i32>(Err(Box::new(BadInput("x".into()))), Expected::Value(1));
        assert!(!verdict.passed);
        assert_eq!(verdict.obtained, Outcome::Error("BadInput(\"x\")".to_string()));
    }

    #[test]
    fn test_error_instance_and_kind_matching() {
        let failure = || -> Failure { Box::new(BadInput("x".into())) };

        assert!(settle::<()>(Err(failure()), Expected::Failure(Box::new(SameFailure(BadInput("x".into()))))).passed);
        assert!(!settle::<()>(Err(failure()), Expected::Failure(Box::new(SameFailure(BadInput("y".into()))))).passed);
        assert!(settle::<()>(Err(failure()), Expected::Failure(Box::new(FailureKind::<BadInput>::new()))).passed);
        assert!(!settle::<()>(Err(failure()), Expected::Failure(Box::new(FailureKind::<Other>::new()))).passed);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_call_info_display() {
        let info = CallInfo {
            label: "add".to_string(),
            args: "(1, 2)".to_string(),
            timeout: None,
        };
        assert_eq!(info.to_string(), "add(1, 2)");
        let info = CallInfo {
            args: "7".to_string(),
            ..info
        };
        assert_eq!(info.to_string(), "add(7)");
    }

    #[test]
    fn test_fn_label() {
        fn sample(_: ()) {}
        fn label_of<F>(_: &F) -> String {
            fn_label::<F>()
        }
        assert_eq!(label_of(&sample), "sample");
        let closure = |_: ()| ();
        assert!(label_of(&closure).ends_with("{{closure}}"));
    }

    #[test]
    fn test_expectation_display() {
        assert_eq!(Expectation::Value("3".into()).to_string(), "to return 3");
        assert_eq!(Expectation::ErrorKind("E").to_string(), "to fail with any E");
        assert_eq!(Outcome::Error("E".into()).to_string(), "failed with E");
    }
}
