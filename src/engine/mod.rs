//! In-process test-call registry and sequential execution engine.
//!
//! Test code registers calls on a [`TestRegistry`]: a function, the arguments to call it with, and the
//! expected outcome (a value, an error instance, or an error type). An [`Engine`] then drains the registry and
//! executes the calls one at a time, each raced against its timeout, producing one [`ExecutionRecord`] per
//! call.
//!
//! ```
//! use ordeal::engine::{Engine, RunOptions, TestRegistry, tally};
//!
//! async fn add((a, b): (i32, i32)) -> Result<i32, String> {
//!     Ok(a + b)
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let registry = TestRegistry::new();
//! registry.register(add, (1, 2)).unwrap().equals(3);
//!
//! let records = Engine::new().run(&registry, RunOptions::default()).await.unwrap();
//! assert!(tally(&records).is_success());
//! # });
//! ```
//!
//! ## Failures
//!
//! A tested function fails by returning `Err` or by panicking. Both end up in the same channel
//! ([`Failure`]); a panic appears as a [`Panicked`] error. Only a panic inside the engine's own comparison
//! step cancels a call ([`Cancellation::Defect`]).
//!
//! ## Modules
//!
//! - `call` - call identity, outcomes, expectations and type erasure
//! - `registry` - [`TestRegistry`] and the [`Specifier`] builder
//! - `execution` - [`ExecutionRecord`] lifecycle and [`tally`]
//! - `runner` - the [`Engine`]

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod call;
mod execution;
mod registry;
mod runner;

pub use call::{CallInfo, Expectation, Failure, Outcome, Panicked, sync_fn};
pub use execution::{Cancellation, ExecutionRecord, TestCallExecution, tally};
pub use registry::{InvalidState, Phase, RegistrationError, Specifier, TestRegistry};
pub use runner::{DEFAULT_TIMEOUT, Engine, RunOptions};
