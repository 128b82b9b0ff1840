#![forbid(unsafe_code)]
//! ordeal: sequential, timeout-aware test execution fed by a lazy directory walk
//!
//! - [`walk`]: depth-first, depth-limited enumeration of a file tree, one item per pull
//! - [`engine`]: the test-call registry and the engine that executes registered calls one at a time, each
//!   raced against a timeout
//! - [`harness`]: folder sessions tying the two together through a module loader, plus reporting
//! - [`cli`]: the `ordeal` command line
//!
//! Path items and run statistics live in the IO-free `ordeal_core` crate and are re-exported here.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli`, `engine` and
//!   `harness` modules enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Tested code**: Panics raised by the functions under test are caught and reported as failures; they
//!   never unwind through the engine.

pub mod cli;
pub mod engine;
pub mod harness;
pub mod walk;

pub use ordeal_core::{ItemKind, PathItem, RunStatistics};

pub use engine::{Engine, ExecutionRecord, RunOptions, TestCallExecution, TestRegistry};
pub use harness::{Harness, HarnessConfig, HarnessError, run_folder};
pub use walk::{Enumeration, EnumerationConfig, WalkError, enumerate};
