//! Directory listings read from the local filesystem.

use std::path::Path;

use panedit_buffer::EntryKind;
use panedit_core::{CoreError, CoreResult, DirEntry, DirectorySource};

/// Lists real directories with `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource {
    /// Include dot-files
    pub show_hidden: bool,
}

impl FsSource {
    pub fn new(show_hidden: bool) -> Self {
        Self { show_hidden }
    }
}

impl DirectorySource for FsSource {
    fn list(&self, path: &Path) -> CoreResult<Vec<DirEntry>> {
        let reader = std::fs::read_dir(path).map_err(|err| {
            tracing::warn!(path = %path.display(), %err, "cannot list directory");
            CoreError::DirectoryUnavailable(path.to_path_buf())
        })?;

        let mut entries = Vec::new();
        for entry in reader {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !self.show_hidden && name.starts_with('.') {
                continue;
            }
            // Follows symlinks; a dangling link lists as a file
            let kind = if entry.path().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let item = match kind {
                EntryKind::Directory => DirEntry::directory(name),
                EntryKind::File => DirEntry::file(name),
            };
            entries.push(item.with_path(entry.path()));
        }

        // Directories first, then alphabetically
        entries.sort_by(|a, b| match (&a.kind, &b.kind) {
            (EntryKind::Directory, EntryKind::File) => std::cmp::Ordering::Less,
            (EntryKind::File, EntryKind::Directory) => std::cmp::Ordering::Greater,
            _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        });

        tracing::debug!(path = %path.display(), count = entries.len(), "listed directory");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_directories_first() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("A.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("zeta")).unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();

        let entries = FsSource::default().list(dir.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["zeta", "A.txt", "b.txt"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].path.as_deref(), Some(dir.path().join("A.txt").as_path()));
    }

    #[test]
    fn test_show_hidden() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();

        let entries = FsSource::new(true).list(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let result = FsSource::default().list(&dir.path().join("nope"));
        assert!(matches!(result, Err(CoreError::DirectoryUnavailable(_))));
    }
}
