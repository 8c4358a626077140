//! Directory listing and navigation

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::{BrowseError, NavigationBlock};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    /// Octal permission bits, e.g. "755"
    pub permissions: String,
}

/// The browser's current directory.
///
/// Always canonical and readable: every way of changing it goes through a
/// validation that leaves it untouched on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserState {
    current_path: PathBuf,
}

impl BrowserState {
    pub fn open(path: &Path) -> Result<Self, BrowseError> {
        Ok(Self {
            current_path: validate_directory(path)?,
        })
    }

    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    /// Only callers holding an already-validated path may move the state.
    pub(crate) fn commit(&mut self, path: PathBuf) {
        self.current_path = path;
    }

    /// Unvalidated state for tests running against an in-memory host.
    #[cfg(test)]
    pub(crate) fn for_tests(path: PathBuf) -> Self {
        Self { current_path: path }
    }
}

/// Lists directories and resolves navigation targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryBrowser;

impl DirectoryBrowser {
    pub fn new() -> Self {
        Self
    }

    /// Entries of `path`, directories first, then by name ignoring case.
    ///
    /// Entries whose metadata cannot be read (vanished, dangling symlink
    /// without lstat access) are left out.
    pub fn list(&self, path: &Path) -> Result<Vec<FileEntry>, BrowseError> {
        let read_dir = fs::read_dir(path).map_err(|source| BrowseError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries: Vec<FileEntry> = read_dir
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let entry_path = entry.path();
                // Follow symlinks so a link to a directory is navigable
                let metadata = fs::metadata(&entry_path)
                    .or_else(|_| fs::symlink_metadata(&entry_path))
                    .ok()?;
                Some(FileEntry {
                    name: entry.file_name().to_string_lossy().to_string(),
                    is_directory: metadata.is_dir(),
                    size: metadata.len(),
                    modified: metadata.modified().ok().map(DateTime::<Local>::from),
                    permissions: permission_bits(&metadata),
                })
            })
            .collect();

        sort_entries(&mut entries);
        Ok(entries)
    }

    /// Canonical path of `current/name`, if it is a readable directory.
    ///
    /// `..` resolves to the clamped parent, validated like any other child.
    pub fn resolve_child(&self, current: &Path, name: &str) -> Result<PathBuf, BrowseError> {
        if name == ".." {
            return validate_directory(&self.parent(current));
        }
        validate_directory(&current.join(name))
    }

    /// Parent of `current`; the root is its own parent.
    pub fn parent(&self, current: &Path) -> PathBuf {
        current
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| current.to_path_buf())
    }
}

fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn validate_directory(path: &Path) -> Result<PathBuf, BrowseError> {
    let canonical = fs::canonicalize(path).map_err(|err| {
        let reason = match err.kind() {
            ErrorKind::NotFound => NavigationBlock::Missing,
            _ => NavigationBlock::Unreadable,
        };
        BrowseError::not_navigable(path, reason)
    })?;

    if !canonical.is_dir() {
        return Err(BrowseError::not_navigable(
            canonical,
            NavigationBlock::NotADirectory,
        ));
    }
    if fs::read_dir(&canonical).is_err() {
        return Err(BrowseError::not_navigable(
            canonical,
            NavigationBlock::Unreadable,
        ));
    }
    Ok(canonical)
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_bits(metadata: &fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "r--".to_string()
    } else {
        "rw-".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("beta.txt"), b"hello").unwrap();
        fs::write(dir.path().join("Alpha.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join("Docs")).unwrap();
        dir
    }

    #[test]
    fn test_list_directories_first_case_insensitive() {
        let dir = fixture();
        let entries = DirectoryBrowser::new().list(dir.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Docs", "zeta", "Alpha.txt", "beta.txt"]);

        let beta = &entries[3];
        assert!(!beta.is_directory);
        assert_eq!(beta.size, 5);
        assert!(beta.modified.is_some());
        assert_eq!(beta.permissions.len(), 3);
    }

    #[test]
    fn test_list_missing_directory_is_unreadable() {
        let dir = fixture();
        let err = DirectoryBrowser::new()
            .list(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, BrowseError::Unreadable { .. }));
    }

    #[test]
    fn test_resolve_child_directory() {
        let dir = fixture();
        let browser = DirectoryBrowser::new();
        let root = fs::canonicalize(dir.path()).unwrap();
        let child = browser.resolve_child(&root, "zeta").unwrap();
        assert_eq!(child, root.join("zeta"));
    }

    #[test]
    fn test_resolve_child_rejects_file_and_keeps_state() {
        let dir = fixture();
        let browser = DirectoryBrowser::new();
        let state = BrowserState::open(dir.path()).unwrap();
        let before = state.clone();

        let err = browser
            .resolve_child(state.current_path(), "beta.txt")
            .unwrap_err();
        assert!(matches!(
            err,
            BrowseError::NotNavigable {
                reason: NavigationBlock::NotADirectory,
                ..
            }
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_resolve_child_missing() {
        let dir = fixture();
        let err = DirectoryBrowser::new()
            .resolve_child(dir.path(), "ghost")
            .unwrap_err();
        assert!(matches!(
            err,
            BrowseError::NotNavigable {
                reason: NavigationBlock::Missing,
                ..
            }
        ));
    }

    #[test]
    fn test_parent_of_root_is_root() {
        let root = Path::new("/");
        assert_eq!(DirectoryBrowser::new().parent(root), PathBuf::from("/"));
    }

    #[test]
    fn test_resolve_dotdot_clamps_at_root() {
        let browser = DirectoryBrowser::new();
        assert_eq!(
            browser.resolve_child(Path::new("/"), "..").unwrap(),
            PathBuf::from("/")
        );
    }

    #[test]
    fn test_open_makes_path_absolute() {
        let state = BrowserState::open(Path::new(".")).unwrap();
        assert!(state.current_path().is_absolute());
    }

    proptest! {
        #[test]
        fn prop_parent_never_leaves_the_tree(parts in proptest::collection::vec("[a-z]{1,6}", 0..6)) {
            let browser = DirectoryBrowser::new();
            let mut path = PathBuf::from("/");
            for part in &parts {
                path.push(part);
            }
            // Ascending len+1 times always lands on, and stays at, the root
            for _ in 0..=parts.len() {
                path = browser.parent(&path);
            }
            prop_assert_eq!(&path, Path::new("/"));
            prop_assert_eq!(browser.parent(&path), PathBuf::from("/"));
        }
    }
}
