//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `gibran-adapters` crate provides implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{BrokerView, Diagnostic, ParsedFile, ResolvedPackage, SourceFile};
use crate::error::GibranResult;

/// Shape of an existing filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `gibran_adapters::filesystem::LocalFilesystem` (production)
/// - `gibran_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// What is at `path`, without following a final symlink. `None` if nothing.
    fn entry_kind(&self, path: &Path) -> GibranResult<Option<EntryKind>>;

    /// Create a single directory whose parent exists.
    fn create_dir(&self, path: &Path) -> GibranResult<()>;

    /// Create a new file; fails if anything already exists at `path`.
    fn create_file(&self, path: &Path, content: &str) -> GibranResult<()>;

    fn read_to_string(&self, path: &Path) -> GibranResult<String>;

    /// Replace `path` with `content` so readers see either the old or the
    /// new contents, never a partial write.
    fn write_atomic(&self, path: &Path, content: &str) -> GibranResult<()>;

    fn remove_file(&self, path: &Path) -> GibranResult<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> GibranResult<()>;
}

/// One directory's worth of classified source files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageBatch {
    pub directory: PathBuf,
    /// Regular files that were read successfully, sorted by name.
    pub files: Vec<SourceFile>,
    /// Broker-classified files present in the directory.
    pub brokers: Vec<PathBuf>,
    /// Generated-classified files present in the directory.
    pub generated: Vec<PathBuf>,
    /// Regular files that could not be read.
    pub read_failures: Vec<Diagnostic>,
}

/// Lazy sequence of package batches, one per directory with Regular files.
///
/// An `Err` item is a directory read error; the walk ends after it.
pub type PackageStream = Box<dyn Iterator<Item = GibranResult<PackageBatch>> + Send>;

/// Port for discovering packages under a project root.
///
/// Implemented by:
/// - `gibran_adapters::walker::PackageWalker`
pub trait PackageSource: Send + Sync {
    /// Directories are yielded in lexical order.
    fn walk(&self, root: &Path) -> PackageStream;
}

/// Port for turning one source file into syntax-level records.
///
/// Implemented by:
/// - `gibran_adapters::parser::GoParser` (tree-sitter)
#[cfg_attr(test, mockall::automock)]
pub trait SourceParser: Send + Sync {
    /// Parse `contents`; `file_name` becomes the `file` of every position.
    fn parse(&self, file_name: &str, contents: &str) -> GibranResult<ParsedFile>;
}

/// Port mapping an import path to the package it names.
///
/// Implementations must be safe for concurrent lookups and compute each
/// import path at most once.
///
/// Implemented by:
/// - `gibran_adapters::resolver::CachingResolver`
#[cfg_attr(test, mockall::automock)]
pub trait ImportResolver: Send + Sync {
    fn resolve(&self, import_path: &str) -> GibranResult<Arc<ResolvedPackage>>;
}

/// Port for rendering broker text.
///
/// Implemented by:
/// - `gibran_adapters::renderer::TeraBrokerRenderer`
#[cfg_attr(test, mockall::automock)]
pub trait BrokerRenderer: Send + Sync {
    fn render(&self, view: &BrokerView) -> GibranResult<String>;
}
