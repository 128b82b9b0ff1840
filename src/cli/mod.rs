//! CLI module for ordeal
//!
//! ## Commands
//!
//! - `scan [path]` - List what the enumeration stream yields (test modules by default)
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use commands::ScanOptions;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Render a diagnostic (with its code and source chain) as a failure.
    pub fn diagnostic(error: impl miette::Diagnostic + Send + Sync + 'static) -> Self {
        Self::failure(format!("{:?}", miette::Report::new(error)))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Sequential, timeout-aware test execution over lazily enumerated folders
#[derive(Parser, Debug)]
#[command(name = "ordeal")]
#[command(version = VERSION)]
#[command(about = "Sequential, timeout-aware test execution over lazily enumerated folders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the items a folder walk yields
    Scan {
        /// Folder (or file) to walk
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,
        /// Expand at most this many folder levels below PATH
        #[arg(long = "depth", value_name = "N")]
        depth: Option<usize>,
        /// Test module extension (repeatable, default: rs)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,
        /// Only list files modified within the last SECS seconds
        #[arg(long = "changed-within", value_name = "SECS")]
        changed_within: Option<u64>,
        /// List every item, folders and non-matching files included
        #[arg(long)]
        all: bool,
        /// Visit dot-entries and build/dependency folders
        #[arg(long)]
        hidden: bool,
        /// Print one JSON object per item
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Scan {
            path,
            depth,
            extensions,
            changed_within,
            all,
            hidden,
            json,
        } => {
            let options = ScanOptions {
                depth,
                extensions,
                changed_within: changed_within.map(Duration::from_secs),
                all,
                hidden,
                json,
            };
            commands::scan(&path, &options)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
