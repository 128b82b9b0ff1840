//! Label filesystem locations as folders or files.
//!
//! A [`PathItem`] is what the enumeration stream yields and what module loaders receive. It keeps the
//! pathname split into a normalised folder prefix plus, for files, a name and an extension, so callers can
//! classify entries without touching the filesystem again.
//!
//! ## Notes
//! - The canonical separator is `/`. Backslashes are rewritten to `/` on construction.
//! - A folder's `folder_path` is empty or ends with the separator.
//! - A file name is split at its **last** dot: `a.test.rs` has name `a.test` and extension `rs`, a name
//!   without a dot has an empty extension, and `.gitignore` has an empty name.

use std::fmt;
use std::path::Path;

/// The canonical path separator used by every [`PathItem`].
pub const SEPARATOR: char = '/';

/// Distinguish folders from files, carrying the file name parts for the latter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum ItemKind {
    Folder,
    File { name: String, extension: String },
}

/// An absolute or relative filesystem location labelled as a folder or a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathItem {
    folder_path: String,
    is_absolute: bool,
    #[cfg_attr(feature = "serde", serde(flatten))]
    kind: ItemKind,
}

impl PathItem {
    /// Build a folder item from a pathname.
    ///
    /// ## Parameters
    /// - `pathname`: the folder location, with or without a trailing separator.
    ///
    /// ## Returns
    /// - (`PathItem`): a folder whose `folder_path` ends with [`SEPARATOR`] (unless `pathname` is empty).
    pub fn folder(pathname: &str) -> Self {
        let mut folder_path = normalize_separators(pathname);
        if !folder_path.is_empty() && !folder_path.ends_with(SEPARATOR) {
            folder_path.push(SEPARATOR);
        }
        Self {
            is_absolute: is_absolute_pathname(&folder_path),
            folder_path,
            kind: ItemKind::Folder,
        }
    }

    /// Build a file item from a pathname, splitting off the folder prefix, name and extension.
    pub fn file(pathname: &str) -> Self {
        let normalized = normalize_separators(pathname);
        let (folder_path, file_name) = match normalized.rfind(SEPARATOR) {
            Some(idx) => (normalized[..=idx].to_string(), &normalized[idx + 1..]),
            None => (String::new(), normalized.as_str()),
        };
        let (name, extension) = match file_name.rfind('.') {
            Some(dot) => (file_name[..dot].to_string(), file_name[dot + 1..].to_string()),
            None => (file_name.to_string(), String::new()),
        };
        Self {
            is_absolute: is_absolute_pathname(&folder_path),
            folder_path,
            kind: ItemKind::File { name, extension },
        }
    }

    /// Build an item from a [`Path`], converting non-UTF-8 components lossily.
    pub fn from_path(path: &Path, is_folder: bool) -> Self {
        let pathname = path.to_string_lossy();
        if is_folder {
            Self::folder(&pathname)
        } else {
            Self::file(&pathname)
        }
    }

    pub fn folder_path(&self) -> &str {
        &self.folder_path
    }

    pub fn is_absolute(&self) -> bool {
        self.is_absolute
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, ItemKind::File { .. })
    }

    /// File name without its extension; `None` for folders.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::File { name, .. } => Some(name),
            ItemKind::Folder => None,
        }
    }

    /// Extension without the dot (possibly empty); `None` for folders.
    pub fn extension(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::File { extension, .. } => Some(extension),
            ItemKind::Folder => None,
        }
    }

    /// Check whether this item is a file whose extension is one of `extensions`.
    ///
    /// ## Parameters
    /// - `extensions`: recognised extensions, with or without a leading dot (`"rs"` and `".rs"` are equal).
    ///
    /// ## Returns
    /// - (`bool`): `true` for a file with a matching extension. Matching is case-sensitive, and a file with
    ///   no extension never matches.
    pub fn has_extension<S: AsRef<str>>(&self, extensions: &[S]) -> bool {
        match &self.kind {
            ItemKind::File { extension, .. } if !extension.is_empty() => extensions
                .iter()
                .any(|candidate| candidate.as_ref().trim_start_matches('.') == extension),
            _ => false,
        }
    }

    /// Render the item back to a pathname string.
    ///
    /// Folders keep their trailing separator. A file whose name ended with a bare dot renders without it,
    /// since the split keeps no trace of an empty extension.
    pub fn render(&self) -> String {
        match &self.kind {
            ItemKind::Folder => self.folder_path.clone(),
            ItemKind::File { name, extension } if extension.is_empty() => format!("{}{}", self.folder_path, name),
            ItemKind::File { name, extension } => format!("{}{}.{}", self.folder_path, name, extension),
        }
    }
}

impl fmt::Display for PathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn normalize_separators(pathname: &str) -> String {
    pathname.replace('\\', "/")
}

/// Leading separator, or a drive prefix such as `C:` / `C:/`.
fn is_absolute_pathname(pathname: &str) -> bool {
    if pathname.starts_with(SEPARATOR) {
        return true;
    }
    let bytes = pathname.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes.len() == 2 || bytes[2] == b'/')
}
