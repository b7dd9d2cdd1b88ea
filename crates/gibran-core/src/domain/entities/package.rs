//! Package records: the in-memory summary of one directory-scoped package.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::common::{Position, to_slash};

/// What a top-level identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Const,
    Var,
    Type,
    Func,
    Method,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Const => "const",
            Self::Var => "var",
            Self::Type => "type",
            Self::Func => "func",
            Self::Method => "method",
        };
        f.write_str(s)
    }
}

/// An `import` spec as written in one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImportRecord {
    pub path: String,
    /// Explicit local name: an identifier, `.` or `_`.
    pub alias: Option<String>,
    pub position: Position,
}

/// How an import is bound inside the file that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    Named(String),
    Dot,
    Blank,
}

impl ImportRecord {
    pub fn new(path: impl Into<String>, alias: Option<String>, position: Position) -> Self {
        Self {
            path: path.into(),
            alias,
            position,
        }
    }

    /// Local binding, using the resolved package name when there is no alias.
    pub fn binding(&self, resolved_name: Option<&str>) -> ImportBinding {
        match self.alias.as_deref() {
            Some(".") => ImportBinding::Dot,
            Some("_") => ImportBinding::Blank,
            Some(name) => ImportBinding::Named(name.to_string()),
            None => ImportBinding::Named(
                resolved_name
                    .map(str::to_string)
                    .unwrap_or_else(|| default_package_name(&self.path)),
            ),
        }
    }
}

/// One top-level identifier defined by the package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DefinitionRecord {
    pub name: String,
    pub kind: DefinitionKind,
    /// Receiver base type, for methods.
    pub receiver: Option<String>,
    pub position: Position,
}

impl DefinitionRecord {
    pub fn new(name: impl Into<String>, kind: DefinitionKind, position: Position) -> Self {
        Self {
            name: name.into(),
            kind,
            receiver: None,
            position,
        }
    }

    pub fn method(
        name: impl Into<String>,
        receiver: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            name: name.into(),
            kind: DefinitionKind::Method,
            receiver: Some(receiver.into()),
            position,
        }
    }

    /// Name as referenced from outside: `Type.Method` for methods.
    pub fn qualified_name(&self) -> String {
        match &self.receiver {
            Some(recv) => format!("{recv}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }

    /// Package-scope names; methods live in their receiver's method set.
    pub fn is_package_scope(&self) -> bool {
        self.kind != DefinitionKind::Method
    }
}

/// An identifier reference found by the parser, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Reference {
    /// `qualifier.Name`
    Qualified {
        qualifier: String,
        name: String,
        position: Position,
    },
    /// An unqualified exported identifier.
    Bare { name: String, position: Position },
}

/// Per-file output of a [`SourceParser`](crate::application::ports::SourceParser).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedFile {
    pub file_name: String,
    pub package_name: String,
    pub imports: Vec<ImportRecord>,
    pub definitions: Vec<DefinitionRecord>,
    pub references: Vec<Reference>,
}

/// Package a use resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UseTarget {
    pub package: String,
    pub import_path: String,
}

/// One reference to an identifier of another package.
///
/// `import_path` names the [`ImportRecord`] the reference goes through;
/// `target` is set only when the resolver located that package and it
/// exports the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UseRecord {
    pub name: String,
    /// Local qualifier; `None` for names reached through a dot import.
    pub qualifier: Option<String>,
    pub import_path: String,
    pub position: Position,
    pub target: Option<UseTarget>,
}

/// Type information the resolver produces for an imported package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    pub import_path: String,
    pub name: String,
    pub exports: BTreeSet<String>,
}

impl ResolvedPackage {
    pub fn exports(&self, name: &str) -> bool {
        self.exports.contains(name)
    }
}

/// Summary of one directory-scoped package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    name: String,
    import_path: String,
    /// Directory relative to the project root, `/`-separated.
    directory: String,
    imports: Vec<ImportRecord>,
    definitions: Vec<DefinitionRecord>,
    uses: Vec<UseRecord>,
    unresolved_imports: Vec<String>,
}

impl PackageRecord {
    /// Build a record, sorting every list into its stable order.
    ///
    /// Imports and definitions sort by position then name; duplicate
    /// `(path, alias)` imports keep their first occurrence.
    pub fn new(
        name: impl Into<String>,
        import_path: impl Into<String>,
        directory: impl Into<String>,
        mut imports: Vec<ImportRecord>,
        mut definitions: Vec<DefinitionRecord>,
        mut uses: Vec<UseRecord>,
        unresolved_imports: impl IntoIterator<Item = String>,
    ) -> Self {
        imports.sort_by(|a, b| {
            (&a.position, &a.path, &a.alias).cmp(&(&b.position, &b.path, &b.alias))
        });
        let mut seen = BTreeSet::new();
        imports.retain(|i| seen.insert((i.path.clone(), i.alias.clone())));

        definitions.sort_by(|a, b| (&a.position, &a.name).cmp(&(&b.position, &b.name)));
        uses.sort_by(|a, b| (&a.position, &a.name).cmp(&(&b.position, &b.name)));

        let unresolved: BTreeSet<String> = unresolved_imports.into_iter().collect();

        Self {
            name: name.into(),
            import_path: import_path.into(),
            directory: directory.into(),
            imports,
            definitions,
            uses,
            unresolved_imports: unresolved.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    pub fn definitions(&self) -> &[DefinitionRecord] {
        &self.definitions
    }

    pub fn uses(&self) -> &[UseRecord] {
        &self.uses
    }

    pub fn unresolved_imports(&self) -> &[String] {
        &self.unresolved_imports
    }
}

/// Where the import resolver looks for packages.
///
/// Passed explicitly into every extraction; nothing reads the process
/// environment behind the caller's back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Module roots or GOPATH-style workspaces, searched in order.
    pub search_paths: Vec<PathBuf>,
    /// Toolchain root holding the standard library under `src/`.
    pub goroot: Option<PathBuf>,
}

impl ResolverConfig {
    pub fn new(search_paths: Vec<PathBuf>, goroot: Option<PathBuf>) -> Self {
        Self {
            search_paths,
            goroot,
        }
    }

    /// Prepend the analysed project root so intra-project imports resolve.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if !self.search_paths.contains(&root) {
            self.search_paths.insert(0, root);
        }
        self
    }
}

/// Where the analysed project lives and what module path it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
    module_path: String,
}

impl ProjectContext {
    pub fn new(root: impl Into<PathBuf>, module_path: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            module_path: module_path.into(),
        }
    }

    /// Build from an optional `go.mod` body; without one the root directory
    /// name stands in for the module path.
    pub fn from_go_mod(root: impl Into<PathBuf>, go_mod: Option<&str>) -> Self {
        let root = root.into();
        let module_path = go_mod
            .and_then(parse_module_path)
            .unwrap_or_else(|| fallback_module_path(&root));
        Self { root, module_path }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// `/`-separated directory relative to the root (`"."` for the root).
    pub fn relative_dir(&self, dir: &Path) -> String {
        to_slash(dir.strip_prefix(&self.root).unwrap_or(dir))
    }

    /// Import path of the package in `dir`.
    pub fn import_path_for(&self, dir: &Path) -> String {
        match self.relative_dir(dir).as_str() {
            "." => self.module_path.clone(),
            rel => format!("{}/{}", self.module_path, rel),
        }
    }
}

fn fallback_module_path(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "main".to_string())
}

/// Extract the module path from a `go.mod` body.
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!path.is_empty()).then(|| path.to_string())
    })
}

/// Conventional package name for an import path: its last element, minus a
/// `go-` prefix and any major-version or `.vN` suffix.
pub fn default_package_name(import_path: &str) -> String {
    let mut segments: Vec<&str> = import_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() > 1 && is_major_version(segments[segments.len() - 1]) {
        segments.pop();
    }
    let last = segments.last().copied().unwrap_or(import_path);

    let last = match last.rsplit_once(".v") {
        Some((head, tail)) if !head.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => head,
        _ => last,
    };
    let last = last.strip_prefix("go-").unwrap_or(last);

    last.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Go export rule: the name starts with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Package name of a directory given its files' package clauses in lexical
/// file order: the first that is neither `main` nor `documentation`, else
/// the first.
pub fn choose_package_name<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut first = None;
    for name in names {
        if !matches!(name, "main" | "documentation") {
            return Some(name);
        }
        first.get_or_insert(name);
    }
    first
}

/// Whether a build constraint ahead of the package clause reads `ignore`,
/// which keeps the file out of every build (`//go:build ignore`,
/// `// +build ignore`).
pub fn is_build_ignored(contents: &str) -> bool {
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(comment) = line.strip_prefix("//") else {
            return false;
        };
        let expr = comment
            .strip_prefix("go:build")
            .or_else(|| comment.trim_start().strip_prefix("+build"));
        if expr.is_some_and(|e| e.trim() == "ignore") {
            return true;
        }
    }
    false
}
