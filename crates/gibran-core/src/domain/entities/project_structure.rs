use std::collections::HashSet;
use std::path::PathBuf;

use crate::domain::error::DomainError;

/// Concrete entries to materialize under a project root.
///
/// This is the output of rendering a manifest. It contains no business
/// logic, only data, in creation order (parents before children).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStructure {
    pub(crate) root: PathBuf,
    pub(crate) entries: Vec<FsEntry>,
}

impl ProjectStructure {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
        }
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: String) {
        self.entries.push(FsEntry::File(FileToWrite {
            path: path.into(),
            content,
        }));
    }

    pub fn add_directory(&mut self, path: impl Into<PathBuf>) {
        self.entries.push(FsEntry::Directory(DirectoryToCreate { path: path.into() }));
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: String) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn with_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.add_directory(path);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.entries.is_empty() {
            return Err(DomainError::InvalidManifest(
                "project structure is empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            let path = entry.path();

            if path.is_absolute() {
                return Err(DomainError::AbsolutePathNotAllowed {
                    path: path.display().to_string(),
                });
            }

            let path_str = path.display().to_string();
            if !seen.insert(path_str.clone()) {
                return Err(DomainError::DuplicatePath { path: path_str });
            }
        }

        Ok(())
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn entries(&self) -> &[FsEntry] {
        &self.entries
    }

    pub fn files(&self) -> impl Iterator<Item = &FileToWrite> {
        self.entries.iter().filter_map(|e| match e {
            FsEntry::File(f) => Some(f),
            _ => None,
        })
    }

    pub fn directories(&self) -> impl Iterator<Item = &DirectoryToCreate> {
        self.entries.iter().filter_map(|e| match e {
            FsEntry::Directory(d) => Some(d),
            _ => None,
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEntry {
    File(FileToWrite),
    Directory(DirectoryToCreate),
}

impl FsEntry {
    /// Path relative to the structure root.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::File(f) => &f.path,
            Self::Directory(d) => &d.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileToWrite {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryToCreate {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_in_insertion_order() {
        let s = ProjectStructure::new("/tmp/app")
            .with_directory("models")
            .with_file("models/user.go", "package models\n".into());

        assert_eq!(s.entry_count(), 2);
        assert_eq!(s.files().count(), 1);
        assert_eq!(s.directories().count(), 1);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        let dup = ProjectStructure::new("/tmp/app")
            .with_file("main.go", String::new())
            .with_file("main.go", String::new());
        assert!(matches!(
            dup.validate(),
            Err(DomainError::DuplicatePath { .. })
        ));

        assert!(ProjectStructure::new("/tmp/app").validate().is_err());
    }

    #[test]
    fn rejects_absolute_entries() {
        let s = ProjectStructure::new("/tmp/app").with_directory("/etc");
        assert!(matches!(
            s.validate(),
            Err(DomainError::AbsolutePathNotAllowed { .. })
        ));
    }
}
