//! Package walker over a real directory tree.
//!
//! Every directory is one candidate package. Files are classified once,
//! here, and only Regular files are read. Directories are visited in
//! lexical order so the stream is reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use gibran_core::{
    application::{
        ApplicationError,
        ports::{PackageBatch, PackageSource, PackageStream},
    },
    domain::{
        Diagnostic, ErrorKind, FileRole, Markers, SourceFile, is_build_ignored, to_slash,
    },
    error::GibranResult,
};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Directory names the Go tool ignores when matching packages.
const IGNORED_DIRS: &[&str] = &["testdata", "vendor"];

pub struct PackageWalker {
    markers: Markers,
}

impl PackageWalker {
    pub fn new(markers: Markers) -> Self {
        Self { markers }
    }
}

impl PackageSource for PackageWalker {
    fn walk(&self, root: &Path) -> PackageStream {
        let dirs = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_package_candidate as fn(&DirEntry) -> bool);

        Box::new(Walk {
            root: root.to_path_buf(),
            markers: self.markers.clone(),
            dirs,
            done: false,
        })
    }
}

fn is_package_candidate(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    !(name.starts_with('.') || name.starts_with('_') || IGNORED_DIRS.contains(&name.as_ref()))
}

struct Walk {
    root: PathBuf,
    markers: Markers,
    dirs: walkdir::FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>,
    done: bool,
}

impl Iterator for Walk {
    type Item = GibranResult<PackageBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let entry = match self.dirs.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    self.done = true;
                    return Some(Err(walk_error(&self.root, e)));
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            match self.scan_dir(entry.path()) {
                Ok(Some(batch)) => return Some(Ok(batch)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl Walk {
    /// Classify and read the files of one directory.
    ///
    /// Returns `None` when the directory holds no Regular file.
    fn scan_dir(&self, dir: &Path) -> GibranResult<Option<PackageBatch>> {
        let mut batch = PackageBatch {
            directory: dir.to_path_buf(),
            ..Default::default()
        };

        let listing = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in listing {
            let entry = entry.map_err(|e| walk_error(dir, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let Some(role) = self.markers.classify(&name) else {
                trace!(file = %name, "Not a source file");
                continue;
            };
            debug!(file = %entry.path().display(), %role, "Classified");

            match role {
                FileRole::Broker => batch.brokers.push(entry.into_path()),
                FileRole::Generated => batch.generated.push(entry.into_path()),
                FileRole::Regular => match fs::read_to_string(entry.path()) {
                    Ok(contents) if is_build_ignored(&contents) => {
                        debug!(file = %entry.path().display(), "Excluded by build constraint");
                    }
                    Ok(contents) => batch
                        .files
                        .push(SourceFile::new(entry.path(), role, contents)),
                    Err(e) => batch.read_failures.push(Diagnostic::new(
                        self.relative(entry.path()),
                        ErrorKind::IoFailure,
                        format!("failed to read source file: {e}"),
                    )),
                },
            }
        }

        let has_regular = !batch.files.is_empty() || !batch.read_failures.is_empty();
        Ok(has_regular.then_some(batch))
    }

    fn relative(&self, path: &Path) -> String {
        to_slash(path.strip_prefix(&self.root).unwrap_or(path))
    }
}

fn walk_error(fallback: &Path, e: walkdir::Error) -> gibran_core::error::GibranError {
    let path = e.path().unwrap_or(fallback).to_path_buf();
    let reason = e
        .io_error()
        .map(|io| io.to_string())
        .unwrap_or_else(|| e.to_string());
    ApplicationError::FilesystemError { path, reason }.into()
}
