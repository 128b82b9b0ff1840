//! Provide the pure, IO-free building blocks shared by the ordeal runner and its tooling.
//!
//! This crate is intentionally small and dependency-light. It contains deterministic helpers that both:
//! - the directory enumeration stream uses to label what it discovers, and
//! - the harness and CLI use to decide which discovered files are test modules and to aggregate results.
//!
//! ## Notes
//!
//! - This is a "pure core" crate: **no IO**, no global state, no async runtime. The layering guard test in
//!   the root package keeps it that way.
//! - Current scope: the path/item model (folder vs file labels with a normalised folder prefix) and run
//!   statistics.

pub mod path;
pub mod stats;

pub use path::{ItemKind, PathItem, SEPARATOR};
pub use stats::RunStatistics;
