//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use gibran_core::{
    application::{
        ApplicationError,
        ports::{EntryKind, Filesystem},
    },
    error::GibranResult,
};

/// In-memory filesystem for testing.
///
/// Clones share the same tree.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
    /// Number of `write_atomic` calls per path.
    atomic_writes: BTreeMap<PathBuf, usize>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
        }
    }

    /// Add a directory and all its ancestors (testing helper).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        if let Ok(mut inner) = self.inner.write() {
            let mut current = PathBuf::new();
            for component in path.as_ref().components() {
                current.push(component);
                inner.directories.insert(current.clone());
            }
        }
    }

    /// Add a file, creating its ancestors (testing helper).
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        if let Ok(mut inner) = self.inner.write() {
            inner.files.insert(path.to_path_buf(), content.into());
        }
    }

    /// Read a file's content (testing helper).
    pub fn read_file(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// All files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// How many times `path` was atomically written.
    pub fn atomic_write_count(&self, path: &Path) -> usize {
        self.inner
            .read()
            .map(|inner| inner.atomic_writes.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFilesystemInner {
    fn require_parent(&self, path: &Path) -> GibranResult<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !self.directories.contains(parent) => {
                Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn occupied(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }
}

fn already_exists(path: &Path) -> ApplicationError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: "Entry already exists".into(),
    }
}

impl Filesystem for MemoryFilesystem {
    fn entry_kind(&self, path: &Path) -> GibranResult<Option<EntryKind>> {
        let inner = self.inner.read().map_err(|_| ApplicationError::LockPoisoned)?;
        Ok(if inner.directories.contains(path) {
            Some(EntryKind::Directory)
        } else if inner.files.contains_key(path) {
            Some(EntryKind::File)
        } else {
            None
        })
    }

    fn create_dir(&self, path: &Path) -> GibranResult<()> {
        let mut inner = self.inner.write().map_err(|_| ApplicationError::LockPoisoned)?;
        if inner.occupied(path) {
            return Err(already_exists(path).into());
        }
        inner.require_parent(path)?;
        inner.directories.insert(path.to_path_buf());
        Ok(())
    }

    fn create_file(&self, path: &Path, content: &str) -> GibranResult<()> {
        let mut inner = self.inner.write().map_err(|_| ApplicationError::LockPoisoned)?;
        if inner.occupied(path) {
            return Err(already_exists(path).into());
        }
        inner.require_parent(path)?;
        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> GibranResult<String> {
        let inner = self.inner.read().map_err(|_| ApplicationError::LockPoisoned)?;
        inner.files.get(path).cloned().ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such file".into(),
            }
            .into()
        })
    }

    fn write_atomic(&self, path: &Path, content: &str) -> GibranResult<()> {
        let mut inner = self.inner.write().map_err(|_| ApplicationError::LockPoisoned)?;
        if inner.directories.contains(path) {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Is a directory".into(),
            }
            .into());
        }
        inner.require_parent(path)?;
        inner.files.insert(path.to_path_buf(), content.to_string());
        *inner.atomic_writes.entry(path.to_path_buf()).or_default() += 1;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> GibranResult<()> {
        let mut inner = self.inner.write().map_err(|_| ApplicationError::LockPoisoned)?;
        inner.files.remove(path);
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> GibranResult<()> {
        let mut inner = self.inner.write().map_err(|_| ApplicationError::LockPoisoned)?;
        let has_children = inner.files.keys().any(|p| p.parent() == Some(path))
            || inner.directories.iter().any(|p| p.parent() == Some(path));
        if has_children {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "Directory not empty".into(),
            }
            .into());
        }
        inner.directories.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_parent_and_refuses_existing() {
        let fs = MemoryFilesystem::new();
        assert!(fs.create_file(Path::new("/a/b.go"), "").is_err());

        fs.add_dir("/a");
        fs.create_file(Path::new("/a/b.go"), "x").unwrap();
        assert!(fs.create_file(Path::new("/a/b.go"), "y").is_err());
        assert_eq!(fs.read_file(Path::new("/a/b.go")).as_deref(), Some("x"));
    }

    #[test]
    fn remove_dir_refuses_non_empty() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/a/b.go", "x");
        assert!(fs.remove_dir(Path::new("/a")).is_err());
        fs.remove_file(Path::new("/a/b.go")).unwrap();
        fs.remove_dir(Path::new("/a")).unwrap();
        assert_eq!(fs.entry_kind(Path::new("/a")).unwrap(), None);
    }

    #[test]
    fn atomic_writes_are_counted() {
        let fs = MemoryFilesystem::new();
        fs.add_dir("/p");
        fs.write_atomic(Path::new("/p/broker.go"), "1").unwrap();
        fs.write_atomic(Path::new("/p/broker.go"), "2").unwrap();
        assert_eq!(fs.atomic_write_count(Path::new("/p/broker.go")), 2);
        assert_eq!(fs.read_file(Path::new("/p/broker.go")).as_deref(), Some("2"));
    }
}
