//! Run reporting
//!
//! The harness drives a [`TestReporter`] so output format stays separate from execution. Implement the
//! trait for other formats (JSON, TAP, ...); [`ConsoleReporter`] is the default pytest-style output.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use ordeal_core::RunStatistics;

use super::loader::ModuleRef;
use crate::engine::{ExecutionRecord, TestCallExecution};

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting a session's progress and results.
pub trait TestReporter {
    /// Called before the first module is discovered
    fn on_discovery_start(&mut self, _root: &Path) {}

    /// Called when a module has been discovered, before it is loaded
    fn on_module_start(&mut self, _module: &ModuleRef<'_>) {}

    /// Called after a module's calls have been executed
    fn on_module_complete(&mut self, module: &ModuleRef<'_>, records: &[ExecutionRecord], stats: &RunStatistics);

    /// Called once every module has run
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Summary of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: RunStatistics,
    pub modules: usize,
    pub duration: Duration,
}

/// Reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl TestReporter for SilentReporter {
    fn on_module_complete(&mut self, _: &ModuleRef<'_>, _: &[ExecutionRecord], _: &RunStatistics) {}

    fn on_run_complete(&mut self, _: &RunSummary) {}
}

// ============================================================================
// Console Reporter
// ============================================================================

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Default console reporter (pytest-style)
///
/// Prints one `module::call STATUS` line per executed call, the expected and obtained outcome of every
/// failure, and a summary bar. Write errors are ignored.
pub struct ConsoleReporter<W = io::Stderr> {
    out: W,
    verbose: bool,
    color: bool,
}

impl ConsoleReporter<io::Stderr> {
    /// Coloured output on stderr.
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(io::stderr(), verbose).with_color(true)
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Uncoloured output on `out`.
    pub fn with_writer(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn status(&self, execution: &TestCallExecution) -> String {
        let color = match execution {
            TestCallExecution::Done { passed: true, .. } => GREEN,
            TestCallExecution::Done { passed: false, .. } | TestCallExecution::Cancelled(_) => RED,
            TestCallExecution::Skipped | TestCallExecution::Initialized => YELLOW,
        };
        self.paint(execution.status(), color)
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_discovery_start(&mut self, root: &Path) {
        if self.verbose {
            let _ = writeln!(self.out, "collecting test modules under {}", root.display());
        }
    }

    fn on_module_complete(&mut self, module: &ModuleRef<'_>, records: &[ExecutionRecord], stats: &RunStatistics) {
        if records.is_empty() {
            if self.verbose {
                let _ = writeln!(self.out, "{} (no test calls)", module.key);
            }
            return;
        }

        for record in records {
            let status = self.status(&record.execution);
            let _ = writeln!(self.out, "{}::{} {}", module.key, record.call, status);

            // Failure details
            match &record.execution {
                TestCallExecution::Done {
                    passed: false,
                    obtained,
                    expected,
                } => {
                    let _ = writeln!(self.out, "    expected {expected}, {obtained}");
                }
                TestCallExecution::Cancelled(cancellation) => {
                    let _ = writeln!(self.out, "    {cancellation}");
                }
                _ => {}
            }
        }

        if self.verbose {
            let _ = writeln!(self.out, "{}: {}", module.key, stats);
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        let stats = &summary.stats;
        let mut parts = Vec::new();
        if stats.ok > 0 {
            parts.push(self.paint(&format!("{} passed", stats.ok), GREEN));
        }
        if stats.ko > 0 {
            parts.push(self.paint(&format!("{} failed", stats.ko), RED));
        }
        if stats.skipped > 0 {
            parts.push(self.paint(&format!("{} skipped", stats.skipped), YELLOW));
        }
        if parts.is_empty() {
            parts.push("no test calls".to_string());
        }

        let _ = writeln!(self.out);
        let _ = writeln!(
            self.out,
            "====== {} in {} module(s), {:.2}s ======",
            parts.join(", "),
            summary.modules,
            summary.duration.as_secs_f64()
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use ordeal_core::PathItem;

    use super::*;
    use crate::engine::{CallInfo, Cancellation, Expectation, Outcome};

    fn record(label: &str, args: &str, execution: TestCallExecution) -> ExecutionRecord {
        ExecutionRecord {
            call: CallInfo {
                label: label.to_string(),
                args: args.to_string(),
                timeout: None,
            },
            execution,
        }
    }

    fn sample_records() -> Vec<ExecutionRecord> {
        vec![
            record(
                "add",
                "(1, 2)",
                TestCallExecution::Done {
                    passed: true,
                    obtained: Outcome::Value("3".into()),
                    expected: Expectation::Value("3".into()),
                },
            ),
            record(
                "add",
                "(2, 2)",
                TestCallExecution::Done {
                    passed: false,
                    obtained: Outcome::Value("4".into()),
                    expected: Expectation::Value("5".into()),
                },
            ),
            record("skipped", "()", TestCallExecution::Skipped),
            record(
                "slow",
                "()",
                TestCallExecution::Cancelled(Cancellation::TimedOut {
                    timeout: Duration::from_millis(10),
                }),
            ),
            record("never", "()", TestCallExecution::Initialized),
        ]
    }

    fn report(verbose: bool) -> String {
        let path = PathBuf::from("/suite/math.rs");
        let item = PathItem::from_path(&path, false);
        let module = ModuleRef {
            item: &item,
            path: &path,
            key: "math.rs",
        };
        let records = sample_records();
        let stats = crate::engine::tally(&records);

        let mut reporter = ConsoleReporter::with_writer(Vec::new(), verbose);
        reporter.on_discovery_start(Path::new("/suite"));
        reporter.on_module_start(&module);
        reporter.on_module_complete(&module, &records, &stats);
        reporter.on_run_complete(&RunSummary {
            stats,
            modules: 1,
            duration: Duration::ZERO,
        });
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_console_report() {
        insta::assert_snapshot!(report(false), @r"
        math.rs::add(1, 2) PASSED
        math.rs::add(2, 2) FAILED
            expected to return 5, returned 4
        math.rs::skipped() SKIPPED
        math.rs::slow() CANCELLED
            timed out after 10ms
        math.rs::never() NOT RUN

        ====== 1 passed, 3 failed, 1 skipped in 1 module(s), 0.00s ======
        ");
    }

    #[test]
    fn test_verbose_report_adds_root_and_module_stats() {
        let output = report(true);
        assert!(output.starts_with("collecting test modules under /suite\n"));
        assert!(output.contains("math.rs: 1 ok, 3 ko, 1 skipped (5 total)\n"));
    }

    #[test]
    fn test_color_wraps_status() {
        let reporter = ConsoleReporter::with_writer(Vec::new(), false).with_color(true);
        assert_eq!(
            reporter.status(&TestCallExecution::Skipped),
            "\x1b[33mSKIPPED\x1b[0m"
        );
    }

    #[test]
    fn test_empty_session_summary() {
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), false);
        reporter.on_run_complete(&RunSummary {
            stats: RunStatistics::default(),
            modules: 0,
            duration: Duration::ZERO,
        });
        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(output, "\n====== no test calls in 0 module(s), 0.00s ======\n");
    }
}
