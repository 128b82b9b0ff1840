//! Harness configuration

use std::time::{Duration, SystemTime};

use crate::engine::{DEFAULT_TIMEOUT, RunOptions};
use crate::walk::{EnumerationConfig, predicate};

/// Settings for one `run_folder` session
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// File extensions (without the dot) that mark a file as a test module
    pub extensions: Vec<String>,
    /// How many folder levels below the root are expanded
    pub depth_limit: Option<usize>,
    /// Only load modules modified at or after this instant
    pub changed_since: Option<SystemTime>,
    /// Visit dot-entries and build/dependency folders too
    pub include_hidden: bool,
    /// Skip calls registered with an explicit timeout
    pub skip_timeboxed_tests: bool,
    /// Timeout for calls registered without one
    pub default_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["rs".to_string()],
            depth_limit: None,
            changed_since: None,
            include_hidden: false,
            skip_timeboxed_tests: false,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of test module extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    pub fn with_changed_since(mut self, since: SystemTime) -> Self {
        self.changed_since = Some(since);
        self
    }

    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    pub fn with_skip_timeboxed_tests(mut self, skip: bool) -> Self {
        self.skip_timeboxed_tests = skip;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Walk configuration derived from these settings
    pub fn enumeration_config(&self) -> EnumerationConfig {
        let mut config = EnumerationConfig::new();
        if let Some(limit) = self.depth_limit {
            config = config.with_depth_limit(limit);
        }
        if !self.include_hidden {
            config = config.with_filter(predicate::skip_hidden());
        }
        if let Some(since) = self.changed_since {
            config = config.with_item_predicate(predicate::modified_since(since));
        }
        config
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            skip_timeboxed_tests: self.skip_timeboxed_tests,
        }
    }
}
