//! Static scaffold manifest and the context used to render its stubs.
//!
//! The manifest maps a relative directory to the files seeded in it. Files
//! named with the generated marker are delegate placeholders; every other
//! file is a hand-authored stub. Neither is ever overwritten once present.

use std::collections::HashMap;
use std::path::PathBuf;

use super::common::RelativePath;
use super::file_role::Markers;
use super::project_structure::ProjectStructure;
use crate::domain::error::DomainError;

/// Bumped whenever the seeded layout changes.
pub const MANIFEST_VERSION: u32 = 1;

/// Body of every seeded package file.
const PACKAGE_STUB: &str = "package {{PACKAGE_NAME}}\n";
const GO_MOD_STUB: &str = "module {{PROJECT_NAME}}\n";

/// One file seeded by the scaffold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubFile {
    pub name: String,
    /// Body with `{{VAR}}` placeholders.
    pub template: String,
}

impl StubFile {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }
}

/// A directory and the files seeded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Relative directory; empty for the project root.
    pub directory: RelativePath,
    pub files: Vec<StubFile>,
}

impl ManifestEntry {
    /// Go package name for files in this entry: the directory's last
    /// component, or `main` at the root.
    pub fn package_name(&self) -> String {
        self.directory
            .as_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string())
    }

    fn is_root(&self) -> bool {
        self.directory.as_path().as_os_str().is_empty()
    }
}

/// Declarative description of a freshly scaffolded project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldManifest {
    version: u32,
    entries: Vec<ManifestEntry>,
}

impl ScaffoldManifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries,
        }
    }

    /// The layered layout: brokers, controllers, models, routers, tests,
    /// views, plus a root entry file and module file.
    pub fn standard(markers: &Markers) -> Result<Self, DomainError> {
        let delegate = markers.generated_file_name();
        let layout: [(&str, &[&str]); 7] = [
            ("", &["main.go"]),
            ("brokers", &[]),
            ("controllers", &["basic.go"]),
            ("models", &["user.go"]),
            ("routers", &["routers.go"]),
            ("tests", &[]),
            ("views", &["views.go"]),
        ];

        let mut entries = Vec::with_capacity(layout.len());
        for (dir, stubs) in layout {
            let mut files = Vec::new();
            if !dir.is_empty() && !stubs.is_empty() {
                files.push(StubFile::new(delegate.clone(), PACKAGE_STUB));
            }
            files.extend(stubs.iter().map(|name| StubFile::new(*name, PACKAGE_STUB)));
            if dir.is_empty() {
                files.push(StubFile::new("go.mod", GO_MOD_STUB));
            }
            entries.push(ManifestEntry {
                directory: RelativePath::try_new(dir)?,
                files,
            });
        }

        let manifest = Self::new(entries);
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Every file and directory path the manifest names, relative to the root.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.entries.iter().flat_map(|e| {
            let dir = (!e.is_root()).then(|| e.directory.as_path().to_path_buf());
            dir.into_iter().chain(
                e.files
                    .iter()
                    .map(move |f| e.directory.as_path().join(&f.name)),
            )
        })
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.entries.is_empty() {
            return Err(DomainError::InvalidManifest("manifest has no entries".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for path in self.paths() {
            let key = RelativePath::try_new(&path)?.to_slash();
            if !seen.insert(key.clone()) {
                return Err(DomainError::DuplicatePath { path: key });
            }
        }
        Ok(())
    }

    /// Expand into concrete entries under `root`.
    pub fn render(
        &self,
        root: impl Into<PathBuf>,
        ctx: &RenderContext,
    ) -> Result<ProjectStructure, DomainError> {
        let mut structure = ProjectStructure::new(root);
        for entry in &self.entries {
            if !entry.is_root() {
                structure.add_directory(entry.directory.as_path());
            }
            let file_ctx = ctx.clone().with_variable("PACKAGE_NAME", entry.package_name());
            for file in &entry.files {
                let path = entry.directory.join(&file.name)?;
                structure.add_file(path.as_path(), file_ctx.render(&file.template));
            }
        }
        structure.validate()?;
        Ok(structure)
    }
}

/// Variables substituted into stub bodies.
///
/// Built-ins: `PROJECT_NAME`, `PROJECT_NAME_SNAKE`; `PACKAGE_NAME` is set
/// per manifest entry while rendering.
#[derive(Debug, Clone)]
pub struct RenderContext {
    project_name: String,
    variables: HashMap<String, String>,
}

impl RenderContext {
    pub fn new(project_name: impl Into<String>) -> Self {
        let name = project_name.into();
        let mut vars = HashMap::new();
        vars.insert("PROJECT_NAME".to_string(), name.clone());
        vars.insert("PROJECT_NAME_SNAKE".to_string(), to_snake_case(&name));
        Self {
            project_name: name,
            variables: vars,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Add or override a variable.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Replace `{{VAR}}` placeholders; unknown placeholders stay as written.
    pub fn render(&self, template: &str) -> String {
        let mut result = template.to_string();
        for (key, value) in &self.variables {
            let placeholder = format!("{{{{{key}}}}}");
            result = result.replace(&placeholder, value);
        }
        result
    }
}

fn to_snake_case(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Project names become a directory and a module path.
pub fn validate_project_name(name: &str) -> Result<(), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidProjectName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name cannot be a relative directory reference"));
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Err(invalid("name cannot start with '.' or '-'"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(invalid(&format!("character '{c}' is not allowed")));
    }
    Ok(())
}
