//! Directory snapshot providers.
//!
//! The engine never reads the filesystem. Whoever embeds it hands in a
//! [`DirectorySource`]; the session asks it for a listing when a pane is
//! opened or reloaded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use panedit_buffer::{EntryKind, Origin};

use crate::{CoreError, CoreResult};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name
    pub name: String,

    /// File or directory
    pub kind: EntryKind,

    /// Canonical path, when known
    pub path: Option<PathBuf>,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            path: None,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            path: None,
        }
    }

    /// Attaches a canonical path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl From<DirEntry> for Origin {
    fn from(entry: DirEntry) -> Self {
        Origin {
            name: entry.name,
            kind: entry.kind,
            path: entry.path,
        }
    }
}

/// Lists directories.
pub trait DirectorySource: Send + Sync {
    /// Returns the entries of `path` in display order.
    fn list(&self, path: &Path) -> CoreResult<Vec<DirEntry>>;
}

/// An in-memory directory tree.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    directories: HashMap<PathBuf, Vec<DirEntry>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a directory, giving each entry a canonical path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, entries: impl IntoIterator<Item = DirEntry>) {
        let path = path.into();
        let entries = entries
            .into_iter()
            .map(|entry| {
                let full = path.join(&entry.name);
                entry.with_path(full)
            })
            .collect();
        self.directories.insert(path, entries);
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, path: impl Into<PathBuf>, entries: impl IntoIterator<Item = DirEntry>) -> Self {
        self.insert(path, entries);
        self
    }

    /// Removes a directory.
    pub fn remove(&mut self, path: &Path) -> Option<Vec<DirEntry>> {
        self.directories.remove(path)
    }
}

impl DirectorySource for MemorySource {
    fn list(&self, path: &Path) -> CoreResult<Vec<DirEntry>> {
        self.directories
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::DirectoryUnavailable(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_assigns_paths() {
        let source = MemorySource::new().with("/dir", [DirEntry::file("a"), DirEntry::directory("sub")]);
        let entries = source.list(Path::new("/dir")).unwrap();
        assert_eq!(entries[0].path.as_deref(), Some(Path::new("/dir/a")));
        assert_eq!(entries[1].kind, EntryKind::Directory);

        let origin: Origin = entries[0].clone().into();
        assert_eq!(origin.name, "a");
    }

    #[test]
    fn test_missing_directory() {
        let source = MemorySource::new();
        assert!(matches!(
            source.list(Path::new("/nope")),
            Err(CoreError::DirectoryUnavailable(_))
        ));
    }
}
