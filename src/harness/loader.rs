//! The module-loading seam.
//!
//! The harness does not know how a test module turns into registrations. A [`ModuleLoader`] receives each
//! discovered module together with the registry to fill; [`StaticLoader`] is the in-process implementation,
//! a table from module keys to registration functions.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::path::Path;

use ordeal_core::PathItem;
use thiserror::Error;

use crate::engine::TestRegistry;

/// Whatever went wrong while loading a module.
pub type LoadError = Box<dyn Error + Send + Sync + 'static>;

/// A discovered test module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleRef<'a> {
    pub item: &'a PathItem,
    /// Absolute pathname.
    pub path: &'a Path,
    /// Pathname relative to the walk root, `/`-separated (`suite/math.rs`).
    pub key: &'a str,
}

/// Turns a discovered module into registrations on `registry`.
///
/// Returning an error, or panicking, is an import failure and aborts the session.
pub trait ModuleLoader {
    fn load(&self, module: &ModuleRef<'_>, registry: &TestRegistry) -> Result<(), LoadError>;
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for &L {
    fn load(&self, module: &ModuleRef<'_>, registry: &TestRegistry) -> Result<(), LoadError> {
        (**self).load(module, registry)
    }
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for Box<L> {
    fn load(&self, module: &ModuleRef<'_>, registry: &TestRegistry) -> Result<(), LoadError> {
        (**self).load(module, registry)
    }
}

/// No registration function is known for a discovered module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no test module registered under `{key}`")]
pub struct UnknownModule {
    pub key: String,
}

type RegisterFn = Box<dyn Fn(&TestRegistry) -> Result<(), LoadError> + Send + Sync>;

/// Loader backed by a fixed table of registration functions, keyed by root-relative module path.
///
/// ```
/// use ordeal::engine::sync_fn;
/// use ordeal::harness::StaticLoader;
///
/// fn double(x: i32) -> Result<i32, String> {
///     Ok(x * 2)
/// }
///
/// let loader = StaticLoader::new().with_module("math.rs", |registry| {
///     registry.register(sync_fn(double), 2)?.named("double").equals(4);
///     Ok(())
/// });
/// assert!(loader.contains("math.rs"));
/// ```
#[derive(Default)]
pub struct StaticLoader {
    modules: BTreeMap<String, RegisterFn>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(
        mut self,
        key: impl Into<String>,
        register: impl Fn(&TestRegistry) -> Result<(), LoadError> + Send + Sync + 'static,
    ) -> Self {
        self.modules.insert(key.into(), Box::new(register));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.modules.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, module: &ModuleRef<'_>, registry: &TestRegistry) -> Result<(), LoadError> {
        match self.modules.get(module.key) {
            Some(register) => register(registry),
            None => Err(Box::new(UnknownModule {
                key: module.key.to_string(),
            })),
        }
    }
}

impl fmt::Debug for StaticLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.modules.keys()).finish()
    }
}
