//! Local filesystem adapter using std::fs.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use gibran_core::{
    application::{
        ApplicationError,
        ports::{EntryKind, Filesystem},
    },
    error::{GibranError, GibranResult},
};
use tempfile::NamedTempFile;

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn entry_kind(&self, path: &Path) -> GibranResult<Option<EntryKind>> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(meta) if meta.file_type().is_symlink() && path.is_dir() => {
                Ok(Some(EntryKind::Directory))
            }
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io_error(path, e, "inspect")),
        }
    }

    fn create_dir(&self, path: &Path) -> GibranResult<()> {
        fs::create_dir(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn create_file(&self, path: &Path, content: &str) -> GibranResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| map_io_error(path, e, "create file"))?;
        file.write_all(content.as_bytes())
            .map_err(|e| map_io_error(path, e, "write file"))
    }

    fn read_to_string(&self, path: &Path) -> GibranResult<String> {
        fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    /// Write to a sibling temp file, then rename it over `path`.
    fn write_atomic(&self, path: &Path, content: &str) -> GibranResult<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| map_io_error(path, e, "create temp file"))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| map_io_error(path, e, "write temp file"))?;
        tmp.persist(path)
            .map_err(|e| map_io_error(path, e.error, "replace file"))?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> GibranResult<()> {
        fs::remove_file(path).map_err(|e| map_io_error(path, e, "remove file"))
    }

    fn remove_dir(&self, path: &Path) -> GibranResult<()> {
        fs::remove_dir(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }
}

pub(crate) fn map_io_error(path: &Path, e: io::Error, operation: &str) -> GibranError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entry_kind_distinguishes_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let file = tmp.path().join("a.go");
        std::fs::write(&file, "package a").unwrap();

        assert_eq!(fs.entry_kind(tmp.path()).unwrap(), Some(EntryKind::Directory));
        assert_eq!(fs.entry_kind(&file).unwrap(), Some(EntryKind::File));
        assert_eq!(fs.entry_kind(&tmp.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn create_file_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let path = tmp.path().join("user.go");

        fs.create_file(&path, "package models\n").unwrap();
        assert!(fs.create_file(&path, "clobbered").is_err());
        assert_eq!(fs.read_to_string(&path).unwrap(), "package models\n");
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let path = tmp.path().join("broker.go");

        fs.write_atomic(&path, "first").unwrap();
        fs.write_atomic(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        let leftovers = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn atomic_write_into_missing_directory_fails_cleanly() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let err = fs
            .write_atomic(&tmp.path().join("missing/broker.go"), "x")
            .unwrap_err();
        assert!(err.to_string().contains("broker.go"));
    }
}
