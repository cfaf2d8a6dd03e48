//! Directory enumeration.
//!
//! The organizer only needs a flat listing of `(path, is_dir)` pairs, so the
//! listing is behind [`DirectoryLister`]. [`FsLister`] reads the real
//! filesystem; [`MemoryLister`] serves a fixed set of entries.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl ListedEntry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Source of directory listings.
pub trait DirectoryLister {
    /// Lists the direct children of `directory` in the source's own order.
    ///
    /// # Errors
    ///
    /// Any error means the listing is incomplete and must not be used.
    fn list(&self, directory: &Path) -> io::Result<Vec<ListedEntry>>;
}

/// Lists directories with [`std::fs::read_dir`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list(&self, directory: &Path) -> io::Result<Vec<ListedEntry>> {
        let mut listed = Vec::new();
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();
            // Symlinks count as directories when they point at one
            let is_dir = file_type.is_dir() || (file_type.is_symlink() && path.is_dir());
            listed.push(ListedEntry { path, is_dir });
        }
        Ok(listed)
    }
}

/// Serves a fixed listing regardless of the directory asked for.
#[derive(Debug, Clone, Default)]
pub struct MemoryLister {
    entries: Vec<ListedEntry>,
    failure: Option<io::ErrorKind>,
}

impl MemoryLister {
    pub fn new(entries: Vec<ListedEntry>) -> Self {
        Self {
            entries,
            failure: None,
        }
    }

    /// A lister whose every call fails with `kind`.
    pub fn failing(kind: io::ErrorKind) -> Self {
        Self {
            entries: Vec::new(),
            failure: Some(kind),
        }
    }
}

impl DirectoryLister for MemoryLister {
    fn list(&self, _directory: &Path) -> io::Result<Vec<ListedEntry>> {
        match self.failure {
            Some(kind) => Err(io::Error::new(kind, "listing unavailable")),
            None => Ok(self.entries.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_lister_reports_files_and_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.txt"), "a").unwrap();
        fs::create_dir(base_path.join("sub")).unwrap();

        let mut listed = FsLister.list(base_path).expect("Failed to list directory");
        listed.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(
            listed,
            vec![
                ListedEntry::file(base_path.join("a.txt")),
                ListedEntry::dir(base_path.join("sub")),
            ]
        );
    }

    #[test]
    fn test_fs_lister_missing_directory_is_error() {
        let result = FsLister.list(Path::new("/non/existent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_memory_lister_preserves_order() {
        let entries = vec![ListedEntry::file("b.txt"), ListedEntry::file("a.txt")];
        let lister = MemoryLister::new(entries.clone());
        assert_eq!(lister.list(Path::new("anywhere")).unwrap(), entries);
    }

    #[test]
    fn test_memory_lister_failure() {
        let lister = MemoryLister::failing(io::ErrorKind::PermissionDenied);
        let err = lister.list(Path::new("x")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
