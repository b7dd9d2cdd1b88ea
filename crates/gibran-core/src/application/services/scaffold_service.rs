//! Scaffold Service - materializes the static manifest under a project root.
//!
//! Workflow:
//! 1. Validate the project name and render the manifest
//! 2. Plan: inspect every target path, stopping at the first conflict
//! 3. Create whatever is missing, leaving existing entries untouched
//!
//! Re-running over an already scaffolded project is a no-op.

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{EntryKind, Filesystem},
    },
    domain::{
        DomainValidator as validator, FsEntry, ProjectStructure, RenderContext, ScaffoldManifest,
    },
    error::{GibranError, GibranResult},
};

/// What a scaffold run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldSummary {
    pub root: PathBuf,
    /// Paths created by this invocation, in creation order.
    pub created: Vec<PathBuf>,
    /// Manifest paths that were already present and left alone.
    pub existing: Vec<PathBuf>,
}

impl ScaffoldSummary {
    /// Nothing had to be created.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

#[derive(Debug)]
enum Step<'a> {
    CreateDir(PathBuf),
    CreateFile(PathBuf, &'a str),
    Keep(PathBuf),
}

/// Scaffolding service.
pub struct ScaffoldService {
    filesystem: Box<dyn Filesystem>,
    manifest: ScaffoldManifest,
}

impl ScaffoldService {
    pub fn new(filesystem: Box<dyn Filesystem>, manifest: ScaffoldManifest) -> Self {
        Self {
            filesystem,
            manifest,
        }
    }

    pub fn manifest(&self) -> &ScaffoldManifest {
        &self.manifest
    }

    /// Scaffold `<parent>/<project_name>`.
    #[instrument(
        skip_all,
        fields(project = %project_name, parent = %parent.display())
    )]
    pub fn scaffold(&self, project_name: &str, parent: &Path) -> GibranResult<ScaffoldSummary> {
        validator::validate_project_name(project_name)?;
        validator::validate_manifest(&self.manifest)?;

        let root = parent.join(project_name);
        let context = RenderContext::new(project_name);
        let structure = self.manifest.render(&root, &context)?;

        info!(
            entries = structure.entry_count(),
            manifest_version = self.manifest.version(),
            "Manifest rendered"
        );

        self.materialize(&structure)
    }

    /// Create every missing entry of `structure`.
    ///
    /// Existing entries of the expected shape count as success. An entry of
    /// the wrong shape is a conflict, reported before anything is created.
    /// On an I/O failure, entries created by this call are removed again.
    pub fn materialize(&self, structure: &ProjectStructure) -> GibranResult<ScaffoldSummary> {
        validator::validate_project_structure(structure)?;

        let root = structure.root();
        let mut steps: Vec<Step<'_>> = self
            .missing_ancestors(root)?
            .into_iter()
            .map(Step::CreateDir)
            .collect();
        let root_missing = !steps.is_empty();

        for entry in structure.entries() {
            let path = root.join(entry.path());
            let existing = if root_missing {
                None
            } else {
                self.filesystem.entry_kind(&path)?
            };

            let step = match (entry, existing) {
                (FsEntry::Directory(_), None) => Step::CreateDir(path),
                (FsEntry::File(f), None) => Step::CreateFile(path, &f.content),
                (FsEntry::Directory(_), Some(EntryKind::Directory))
                | (FsEntry::File(_), Some(EntryKind::File)) => Step::Keep(path),
                (FsEntry::Directory(_), Some(EntryKind::File)) => {
                    return Err(conflict(path, "directory", "file"));
                }
                (FsEntry::File(_), Some(EntryKind::Directory)) => {
                    return Err(conflict(path, "file", "directory"));
                }
            };
            steps.push(step);
        }

        let mut summary = ScaffoldSummary {
            root: root.to_path_buf(),
            ..Default::default()
        };

        match self.apply(&steps, &mut summary) {
            Ok(()) => {
                info!(
                    created = summary.created.len(),
                    existing = summary.existing.len(),
                    "Scaffold completed"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "Scaffold failed, rolling back");
                self.rollback(&summary.created);
                Err(e)
            }
        }
    }

    fn apply(&self, steps: &[Step<'_>], summary: &mut ScaffoldSummary) -> GibranResult<()> {
        for step in steps {
            match step {
                Step::CreateDir(path) => {
                    self.filesystem.create_dir(path)?;
                    debug!(path = %path.display(), "Created directory");
                    summary.created.push(path.clone());
                }
                Step::CreateFile(path, content) => {
                    self.filesystem.create_file(path, content)?;
                    debug!(path = %path.display(), "Created file");
                    summary.created.push(path.clone());
                }
                Step::Keep(path) => {
                    debug!(path = %path.display(), "Already present");
                    summary.existing.push(path.clone());
                }
            }
        }
        Ok(())
    }

    /// Ancestors of `root` (inclusive) that do not exist yet, outermost first.
    fn missing_ancestors(&self, root: &Path) -> GibranResult<Vec<PathBuf>> {
        let mut missing = Vec::new();
        for ancestor in root.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            match self.filesystem.entry_kind(ancestor)? {
                None => missing.push(ancestor.to_path_buf()),
                Some(EntryKind::Directory) => break,
                Some(EntryKind::File) => {
                    return Err(conflict(ancestor.to_path_buf(), "directory", "file"));
                }
            }
        }
        missing.reverse();
        Ok(missing)
    }

    /// Best-effort removal of `created`, newest first.
    fn rollback(&self, created: &[PathBuf]) {
        for path in created.iter().rev() {
            let result = match self.filesystem.entry_kind(path) {
                Ok(Some(EntryKind::Directory)) => self.filesystem.remove_dir(path),
                Ok(Some(EntryKind::File)) => self.filesystem.remove_file(path),
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(error = %e, path = %path.display(), "Rollback failed");
            }
        }
    }
}

fn conflict(path: PathBuf, expected: &str, found: &str) -> GibranError {
    ApplicationError::Conflict {
        path,
        expected: expected.to_string(),
        found: found.to_string(),
    }
    .into()
}
