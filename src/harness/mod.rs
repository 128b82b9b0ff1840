//! Folder-level test sessions.
//!
//! [`run_folder`] walks a folder, and for every file whose extension marks it as a test module: asks the
//! [`ModuleLoader`] to register its calls, runs them with the [`Engine`], reports the records and folds the
//! module's statistics into the session total. Modules run strictly one after another.
//!
//! ## Modules
//!
//! - `config` - [`HarnessConfig`]
//! - `loader` - the [`ModuleLoader`] seam and [`StaticLoader`]
//! - `report` - [`TestReporter`] and [`ConsoleReporter`]

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod config;
mod loader;
mod report;

pub use config::HarnessConfig;
pub use loader::{LoadError, ModuleLoader, ModuleRef, StaticLoader, UnknownModule};
pub use report::{ConsoleReporter, RunSummary, SilentReporter, TestReporter};

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use miette::Diagnostic;
use ordeal_core::RunStatistics;
use thiserror::Error;

use crate::engine::{Engine, InvalidState, Panicked, TestRegistry, tally};
use crate::walk::{Enumeration, WalkError};

/// A failure that ends a session. Failing test calls are not errors; they are counted in the statistics.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("failed to load test module `{}`", path.display())]
    #[diagnostic(code(ordeal::harness::import))]
    Import {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Enumeration(#[from] WalkError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidState(#[from] InvalidState),
}

/// Runs every test module found under a folder.
#[derive(Debug)]
pub struct Harness<L> {
    config: HarnessConfig,
    loader: L,
}

impl<L: ModuleLoader> Harness<L> {
    pub fn new(config: HarnessConfig, loader: L) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Walk `root` and run each discovered test module.
    ///
    /// Stops at the first import failure or walk error; statistics of the modules that already ran are
    /// lost with it. A failed import never leaves partial registrations behind.
    #[tracing::instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub async fn run_folder(
        &self,
        root: impl AsRef<Path>,
        reporter: &mut dyn TestReporter,
    ) -> Result<RunStatistics, HarnessError> {
        let started = Instant::now();
        let mut walk = Enumeration::new(root, self.config.enumeration_config());
        let root = walk.root().to_path_buf();
        reporter.on_discovery_start(&root);

        let registry = TestRegistry::new();
        let engine = Engine::new().with_default_timeout(self.config.default_timeout);
        let options = self.config.run_options();

        let mut totals = RunStatistics::default();
        let mut modules = 0;
        while let Some(item) = walk.next_item().await {
            let item = item?;
            if !item.has_extension(self.config.extensions.as_slice()) {
                continue;
            }

            let path = PathBuf::from(item.render());
            let key = module_key(&root, &path);
            let module = ModuleRef {
                item: &item,
                path: &path,
                key: &key,
            };
            tracing::debug!(module = %key, "loading test module");
            reporter.on_module_start(&module);

            if let Err(source) = self.load(&module, &registry) {
                tracing::warn!(module = %key, error = %source, "import failed");
                registry.reset()?;
                return Err(HarnessError::Import { path, source });
            }

            let records = engine.run(&registry, options).await?;
            let stats = tally(&records);
            reporter.on_module_complete(&module, &records, &stats);
            registry.reset()?;

            totals += stats;
            modules += 1;
        }

        tracing::info!(modules, %totals, "session complete");
        reporter.on_run_complete(&RunSummary {
            stats: totals,
            modules,
            duration: started.elapsed(),
        });
        Ok(totals)
    }

    fn load(&self, module: &ModuleRef<'_>, registry: &TestRegistry) -> Result<(), LoadError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.loader.load(module, registry)))
            .unwrap_or_else(|payload| Err(Box::new(Panicked::from_payload(payload.as_ref())) as LoadError))
    }
}

/// One-shot form of [`Harness::run_folder`].
pub async fn run_folder<L: ModuleLoader>(
    root: impl AsRef<Path>,
    config: HarnessConfig,
    loader: L,
    reporter: &mut dyn TestReporter,
) -> Result<RunStatistics, HarnessError> {
    Harness::new(config, loader).run_folder(root, reporter).await
}

/// Root-relative, `/`-separated key of a module. A root that is itself a file keys by its file name.
fn module_key(root: &Path, path: &Path) -> String {
    let relative = match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative,
        _ => path.file_name().map(Path::new).unwrap_or(path),
    };
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
