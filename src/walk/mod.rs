//! Lazy, depth-limited directory enumeration.
//!
//! An [`Enumeration`] walks a file tree depth-first and yields one [`ordeal_core::PathItem`] per pull.
//! Nothing is read ahead of what the consumer asks for: each pull probes exactly one pending pathname, and a
//! folder's children are listed only when that folder itself is being yielded.
//!
//! ## Order
//!
//! A folder is yielded before its children (pre-order). Siblings are visited in the order given by the
//! configured comparator, [`default_order`] unless overridden: plain files first, then folders, each group
//! ascending by name. A folder's whole subtree is visited before its next sibling.
//!
//! ## Modules
//!
//! - `stream` - the [`Enumeration`] state machine and its `Stream` adapter
//! - `predicate` - ready-made filters (hidden entries, freshness)

mod stream;

pub mod predicate;

pub use stream::{Enumeration, enumerate};

use std::cmp::Ordering;
use std::fmt;
use std::fs::{FileType, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

// ============================================================================
// Raw directory entries
// ============================================================================

/// Coarse entry type, taken from the directory listing. Symlinks are classified by their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
    /// Special files and dangling symlinks.
    Other,
}

impl From<FileType> for EntryKind {
    fn from(file_type: FileType) -> Self {
        if file_type.is_dir() {
            EntryKind::Folder
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// A child entry as read from a directory listing; this is what filters and comparators see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl RawEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Visit plain files before folders, and names in ascending order within each group.
///
/// This is the visitation order among siblings. The walk keeps pending entries on a stack and compensates
/// for its last-in-first-out popping itself, so comparators never need to be written "backwards".
pub fn default_order(a: &RawEntry, b: &RawEntry) -> Ordering {
    a.is_folder().cmp(&b.is_folder()).then_with(|| a.name.cmp(&b.name))
}

// ============================================================================
// Configuration
// ============================================================================

pub type SortComparator = Arc<dyn Fn(&RawEntry, &RawEntry) -> Ordering + Send + Sync>;
pub type EntryFilter = Arc<dyn Fn(&RawEntry) -> bool + Send + Sync>;
pub type ItemPredicate = Arc<dyn Fn(&Path, &Metadata) -> bool + Send + Sync>;

/// Configuration of one enumeration.
///
/// The walk takes its own copy, so a configuration can't change under a running enumeration.
#[derive(Clone, Default)]
pub struct EnumerationConfig {
    /// Sibling visitation order; [`default_order`] when unset.
    pub sort: Option<SortComparator>,
    /// Applied to listed children before sorting; rejected entries are never visited.
    pub filter: Option<EntryFilter>,
    /// Folders deeper than `root + depth_limit` segments are yielded but not expanded.
    pub depth_limit: Option<usize>,
    /// Applied to files once probed; rejected files are skipped without being yielded.
    pub item_predicate: Option<ItemPredicate>,
}

impl EnumerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sibling visitation order.
    pub fn with_sort(mut self, sort: impl Fn(&RawEntry, &RawEntry) -> Ordering + Send + Sync + 'static) -> Self {
        self.sort = Some(Arc::new(sort));
        self
    }

    /// Set the child entry filter.
    pub fn with_filter(mut self, filter: impl Fn(&RawEntry) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Set the depth limit, relative to the root.
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    /// Set the file predicate (for example a freshness check).
    pub fn with_item_predicate(
        mut self,
        predicate: impl Fn(&Path, &Metadata) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.item_predicate = Some(Arc::new(predicate));
        self
    }

    fn admits(&self, entry: &RawEntry) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(entry))
    }

    fn compare(&self, a: &RawEntry, b: &RawEntry) -> Ordering {
        match &self.sort {
            Some(sort) => sort(a, b),
            None => default_order(a, b),
        }
    }

    fn accepts_file(&self, path: &Path, metadata: &Metadata) -> bool {
        self.item_predicate
            .as_ref()
            .is_none_or(|predicate| predicate(path, metadata))
    }
}

impl fmt::Debug for EnumerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumerationConfig")
            .field("sort", &self.sort.as_ref().map(|_| "<comparator>"))
            .field("filter", &self.filter.as_ref().map(|_| "<filter>"))
            .field("depth_limit", &self.depth_limit)
            .field("item_predicate", &self.item_predicate.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A filesystem failure that ends an enumeration.
#[derive(Debug, Error, Diagnostic)]
pub enum WalkError {
    #[error("failed to read directory `{}`", path.display())]
    #[diagnostic(code(ordeal::walk::read_dir))]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to inspect `{}`", path.display())]
    #[diagnostic(code(ordeal::walk::probe))]
    Probe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    /// The pathname the failing operation was about.
    pub fn path(&self) -> &Path {
        match self {
            WalkError::ReadDir { path, .. } | WalkError::Probe { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: EntryKind) -> RawEntry {
        RawEntry {
            name: name.to_string(),
            path: PathBuf::from("/root").join(name),
            kind,
        }
    }

    #[test]
    fn test_default_order_puts_files_first_then_names_ascending() {
        let mut entries = vec![
            entry("zeta", EntryKind::Folder),
            entry("b.rs", EntryKind::File),
            entry("alpha", EntryKind::Folder),
            entry("link", EntryKind::Other),
            entry("a.rs", EntryKind::File),
        ];
        entries.sort_by(default_order);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.rs", "b.rs", "link", "alpha", "zeta"]);
    }

    #[test]
    fn test_config_defaults_admit_everything() {
        let config = EnumerationConfig::new();
        assert!(config.admits(&entry(".hidden", EntryKind::File)));
        assert_eq!(
            config.compare(&entry("a", EntryKind::Folder), &entry("b", EntryKind::File)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_config_uses_custom_sort_and_filter() {
        let config = EnumerationConfig::new()
            .with_sort(|a, b| b.name.cmp(&a.name))
            .with_filter(|e| !e.name.starts_with('_'))
            .with_depth_limit(2);
        assert!(!config.admits(&entry("_skip", EntryKind::File)));
        assert_eq!(
            config.compare(&entry("a", EntryKind::File), &entry("b", EntryKind::File)),
            Ordering::Greater
        );
        assert_eq!(config.depth_limit, Some(2));
    }

    #[test]
    fn test_walk_error_reports_path() {
        let err = WalkError::ReadDir {
            path: PathBuf::from("/nope"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.path(), Path::new("/nope"));
        assert_eq!(err.to_string(), "failed to read directory `/nope`");
    }
}
