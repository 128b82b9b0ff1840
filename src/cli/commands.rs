//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};

use futures::StreamExt;

use super::{CliError, CliResult, ExitCode};
use crate::harness::HarnessConfig;
use crate::walk::enumerate;

/// Options for `ordeal scan`.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub depth: Option<usize>,
    /// Test module extensions; the harness default when empty.
    pub extensions: Vec<String>,
    pub changed_within: Option<Duration>,
    pub all: bool,
    pub hidden: bool,
    pub json: bool,
}

impl ScanOptions {
    /// The harness settings this scan mirrors, so `scan` lists exactly what a session would load.
    pub fn harness_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::new().with_hidden(self.hidden);
        if !self.extensions.is_empty() {
            config = config.with_extensions(self.extensions.iter().cloned());
        }
        if let Some(depth) = self.depth {
            config = config.with_depth_limit(depth);
        }
        if let Some(since) = self
            .changed_within
            .and_then(|window| SystemTime::now().checked_sub(window))
        {
            config = config.with_changed_since(since);
        }
        config
    }
}

/// List the items a walk of `path` yields, on stdout.
pub fn scan(path: &Path, options: &ScanOptions) -> CliResult<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Error starting runtime: {}", e)))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let listed = runtime.block_on(scan_to(path, options, &mut out))?;
    tracing::debug!(listed, path = %path.display(), "scan complete");
    Ok(ExitCode::SUCCESS)
}

/// Write one line per listed item to `out` and return how many were listed.
pub async fn scan_to<W: Write>(path: &Path, options: &ScanOptions, out: &mut W) -> CliResult<usize> {
    let config = options.harness_config();
    let mut items = enumerate(path, config.enumeration_config());

    let mut listed = 0;
    while let Some(item) = items.next().await {
        let item = item.map_err(CliError::diagnostic)?;
        if !options.all && !item.has_extension(config.extensions.as_slice()) {
            continue;
        }

        let line = if options.json {
            serde_json::to_string(&item).map_err(|e| CliError::failure(format!("Error encoding item: {}", e)))?
        } else {
            item.render()
        };
        writeln!(out, "{}", line).map_err(|e| CliError::failure(format!("Error writing output: {}", e)))?;
        listed += 1;
    }
    Ok(listed)
}
