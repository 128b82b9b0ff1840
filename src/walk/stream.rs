//! The enumeration state machine.
//!
//! State is a stack of pending absolute pathnames. Each pull pops one pathname and probes it; a folder is
//! yielded immediately, after its (filtered, sorted) children have been pushed so they are popped next.

use std::io;
use std::path::{Component, Path, PathBuf};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use ordeal_core::PathItem;
use tokio::fs;

use super::{EnumerationConfig, EntryKind, RawEntry, WalkError};

/// A lazy, finite, non-restartable walk over a file tree.
///
/// Pull items with [`Enumeration::next_item`] or turn the walk into a `Stream` with
/// [`Enumeration::into_stream`]. Pulls take `&mut self`, so a second pull can't start before the previous
/// one has delivered its item.
pub struct Enumeration {
    root: PathBuf,
    config: EnumerationConfig,
    /// Pending pathnames; the last element is visited next.
    stack: Vec<PathBuf>,
    /// Folders with more segments than this are yielded but not expanded.
    max_segments: Option<usize>,
    /// A listing failure, surfaced on the pull after its folder was yielded.
    deferred_error: Option<WalkError>,
    finished: bool,
}

impl Enumeration {
    /// Prepare a walk rooted at `root`. Nothing is read until the first pull.
    ///
    /// The root is made absolute and lexically normalised (`.` and `..` removed); symlinks are not
    /// resolved. A root that does not exist produces an empty walk.
    pub fn new(root: impl AsRef<Path>, config: EnumerationConfig) -> Self {
        let root = normalize_root(root.as_ref());
        let max_segments = config.depth_limit.map(|limit| segment_count(&root) + limit);
        Self {
            stack: vec![root.clone()],
            root,
            config,
            max_segments,
            deferred_error: None,
            finished: false,
        }
    }

    /// The absolute, normalised root this walk started from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `true` once the walk has ended, normally or with an error.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Produce the next item, `None` at the end, or the error that ends the walk.
    ///
    /// After an error has been returned every further pull returns `None`.
    pub async fn next_item(&mut self) -> Option<Result<PathItem, WalkError>> {
        if let Some(error) = self.deferred_error.take() {
            self.finish();
            return Some(Err(error));
        }
        if self.finished {
            return None;
        }

        while let Some(path) = self.stack.pop() {
            let metadata = match fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(source) if source.kind() == io::ErrorKind::NotFound => {
                    tracing::trace!(path = %path.display(), "skipping entry that no longer exists");
                    continue;
                }
                Err(source) => {
                    self.finish();
                    return Some(Err(WalkError::Probe { path, source }));
                }
            };

            if metadata.is_dir() {
                self.expand(&path).await;
                tracing::trace!(path = %path.display(), "yielding folder");
                return Some(Ok(PathItem::from_path(&path, true)));
            }

            if !self.config.accepts_file(&path, &metadata) {
                tracing::trace!(path = %path.display(), "file rejected by item predicate");
                continue;
            }
            tracing::trace!(path = %path.display(), "yielding file");
            return Some(Ok(PathItem::from_path(&path, false)));
        }

        self.finish();
        None
    }

    /// Adapt the walk into a `Stream`. The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<PathItem, WalkError>> + Send {
        stream::unfold(self, |mut walk| async move {
            let item = walk.next_item().await?;
            Some((item, walk))
        })
    }

    async fn expand(&mut self, folder: &Path) {
        if self.max_segments.is_some_and(|max| segment_count(folder) > max) {
            tracing::debug!(path = %folder.display(), "depth limit reached, not expanding");
            return;
        }

        match self.read_children(folder).await {
            Ok(children) => {
                // `children` is in visitation order. The stack pops from the end, so push them reversed:
                // the first child to visit lands on top.
                self.stack.extend(children.into_iter().rev().map(|entry| entry.path));
            }
            Err(error) => {
                tracing::warn!(path = %folder.display(), error = %error, "listing failed, ending enumeration");
                self.deferred_error = Some(error);
            }
        }
    }

    async fn read_children(&self, folder: &Path) -> Result<Vec<RawEntry>, WalkError> {
        let read_dir_error = |source: io::Error| WalkError::ReadDir {
            path: folder.to_path_buf(),
            source,
        };

        let mut listing = fs::read_dir(folder).await.map_err(read_dir_error)?;
        let mut children = Vec::new();
        while let Some(entry) = listing.next_entry().await.map_err(read_dir_error)? {
            let file_type = entry.file_type().await.map_err(read_dir_error)?;
            let path = entry.path();
            let kind = if file_type.is_symlink() {
                symlink_kind(&path).await
            } else {
                EntryKind::from(file_type)
            };
            let child = RawEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                kind,
            };
            if self.config.admits(&child) {
                children.push(child);
            }
        }
        children.sort_by(|a, b| self.config.compare(a, b));
        Ok(children)
    }

    fn finish(&mut self) {
        self.finished = true;
        self.stack.clear();
    }
}

/// Walk `root` as a boxed `Stream`.
pub fn enumerate(
    root: impl AsRef<Path>,
    config: EnumerationConfig,
) -> BoxStream<'static, Result<PathItem, WalkError>> {
    Enumeration::new(root, config).into_stream().boxed()
}

/// Classify a symlink by its target so linked folders sort with folders. Dangling links stay `Other`.
async fn symlink_kind(path: &Path) -> EntryKind {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => EntryKind::Folder,
        Ok(metadata) if metadata.is_file() => EntryKind::File,
        _ => EntryKind::Other,
    }
}

fn normalize_root(root: &Path) -> PathBuf {
    let absolute = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    lexically_normalize(&absolute)
}

fn lexically_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn segment_count(path: &Path) -> usize {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count()
}
