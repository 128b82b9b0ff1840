//! Ready-made filters and predicates for [`EnumerationConfig`](super::EnumerationConfig).

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use super::RawEntry;

/// Folder names that never contain test modules worth visiting.
pub const IGNORED_FOLDERS: &[&str] = &["target", "node_modules"];

/// Entry filter dropping dot-entries and the [`IGNORED_FOLDERS`].
pub fn skip_hidden() -> impl Fn(&RawEntry) -> bool + Send + Sync + 'static {
    |entry: &RawEntry| {
        if entry.name.starts_with('.') {
            return false;
        }
        !(entry.is_folder() && IGNORED_FOLDERS.contains(&entry.name.as_str()))
    }
}

/// Freshness predicate: keep files modified at or after `since`.
///
/// Files whose modification time the platform can't report are kept.
pub fn modified_since(since: SystemTime) -> impl Fn(&Path, &Metadata) -> bool + Send + Sync + 'static {
    move |_path: &Path, metadata: &Metadata| match metadata.modified() {
        Ok(modified) => modified >= since,
        Err(_) => true,
    }
}
