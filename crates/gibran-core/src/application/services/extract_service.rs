//! Symbol extraction: one directory of Regular files in, one package record out.
//!
//! Files are parsed in parallel; resolution runs once all of them are
//! parsed, since identifiers may cross files within the package.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::{
    application::ports::{ImportResolver, PackageBatch, SourceParser},
    domain::{
        Diagnostic, ErrorKind, ImportBinding, PackageRecord, ParsedFile, ProjectContext,
        Reference, ResolvedPackage, UseRecord, UseTarget, choose_package_name,
    },
    error::GibranResult,
};

/// Extraction result: the record (if any file parsed) plus per-unit diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub record: Option<PackageRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds [`PackageRecord`]s from parsed source.
pub struct SymbolExtractor {
    parser: Box<dyn SourceParser>,
    resolver: Arc<dyn ImportResolver>,
}

impl SymbolExtractor {
    pub fn new(parser: Box<dyn SourceParser>, resolver: Arc<dyn ImportResolver>) -> Self {
        Self { parser, resolver }
    }

    #[instrument(skip_all, fields(dir = %batch.directory.display(), files = batch.files.len()))]
    pub fn extract(&self, batch: &PackageBatch, project: &ProjectContext) -> Extraction {
        let rel_dir = project.relative_dir(&batch.directory);
        let unit = |file: &str| match rel_dir.as_str() {
            "." => file.to_string(),
            dir => format!("{dir}/{file}"),
        };

        let mut files: Vec<_> = batch.files.iter().collect();
        files.sort_by(|a, b| a.name().cmp(b.name()));

        let parsed: Vec<(&str, GibranResult<ParsedFile>)> = files
            .par_iter()
            .map(|f| (f.name(), self.parser.parse(f.name(), f.contents())))
            .collect();

        let mut diagnostics = Vec::new();
        let mut accepted: Vec<ParsedFile> = Vec::new();
        for (name, result) in parsed {
            match result {
                Ok(file) => accepted.push(file),
                Err(e) => {
                    warn!(file = name, error = %e, "Parse failed");
                    diagnostics.push(Diagnostic::new(
                        unit(name),
                        ErrorKind::ParseFailure,
                        e.detail(),
                    ));
                }
            }
        }

        let Some(package_name) =
            choose_package_name(accepted.iter().map(|f| f.package_name.as_str()))
                .map(str::to_string)
        else {
            return Extraction {
                record: None,
                diagnostics,
            };
        };

        accepted.retain(|f| {
            if f.package_name == package_name {
                return true;
            }
            warn!(
                file = %f.file_name,
                found = %f.package_name,
                expected = %package_name,
                "Package clause mismatch"
            );
            diagnostics.push(Diagnostic::new(
                unit(&f.file_name),
                ErrorKind::ParseFailure,
                format!(
                    "package clause `{}` does not match package `{}`",
                    f.package_name, package_name
                ),
            ));
            false
        });

        let import_paths: BTreeSet<&str> = accepted
            .iter()
            .flat_map(|f| f.imports.iter().map(|i| i.path.as_str()))
            .collect();
        let resolved = self.resolve_all(&import_paths);

        let mut unresolved = Vec::new();
        for (path, result) in &resolved {
            if let Err(reason) = result {
                warn!(import = *path, %reason, "Unresolved import");
                unresolved.push(path.to_string());
                diagnostics.push(Diagnostic::new(
                    rel_dir.clone(),
                    ErrorKind::UnresolvedImport,
                    reason.clone(),
                ));
            }
        }

        let local_names: HashSet<&str> = accepted
            .iter()
            .flat_map(|f| f.definitions.iter())
            .filter(|d| d.is_package_scope())
            .map(|d| d.name.as_str())
            .collect();

        let mut uses = Vec::new();
        for file in &accepted {
            collect_uses(file, &resolved, &local_names, &mut uses);
        }

        let imports = accepted.iter().flat_map(|f| f.imports.iter().cloned()).collect();
        let definitions = accepted
            .iter()
            .flat_map(|f| f.definitions.iter().cloned())
            .collect();

        let record = PackageRecord::new(
            package_name,
            project.import_path_for(&batch.directory),
            rel_dir.clone(),
            imports,
            definitions,
            uses,
            unresolved,
        );
        debug!(
            package = record.name(),
            definitions = record.definitions().len(),
            uses = record.uses().len(),
            "Package extracted"
        );

        Extraction {
            record: Some(record),
            diagnostics,
        }
    }

    /// Resolve every distinct import path once; errors become reason strings.
    fn resolve_all<'a>(
        &self,
        paths: &BTreeSet<&'a str>,
    ) -> BTreeMap<&'a str, Result<Arc<ResolvedPackage>, String>> {
        paths
            .par_iter()
            .map(|path| {
                let result = self.resolver.resolve(path).map_err(|e| e.detail());
                (*path, result)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }
}

/// Turn one file's references into uses, through that file's own imports.
fn collect_uses(
    file: &ParsedFile,
    resolved: &BTreeMap<&str, Result<Arc<ResolvedPackage>, String>>,
    local_names: &HashSet<&str>,
    uses: &mut Vec<UseRecord>,
) {
    let lookup = |path: &str| resolved.get(path).and_then(|r| r.as_ref().ok());

    let mut named: HashMap<String, &str> = HashMap::new();
    let mut dotted: Vec<&str> = Vec::new();
    for import in &file.imports {
        let package = lookup(&import.path);
        match import.binding(package.map(|p| p.name.as_str())) {
            ImportBinding::Named(name) => {
                named.entry(name).or_insert(import.path.as_str());
            }
            ImportBinding::Dot => dotted.push(import.path.as_str()),
            ImportBinding::Blank => {}
        }
    }

    let target_for = |path: &str, name: &str| {
        lookup(path)
            .filter(|p| p.exports(name))
            .map(|p| UseTarget {
                package: p.name.clone(),
                import_path: p.import_path.clone(),
            })
    };

    for reference in &file.references {
        match reference {
            Reference::Qualified {
                qualifier,
                name,
                position,
            } => {
                let Some(path) = named.get(qualifier.as_str()) else {
                    continue;
                };
                uses.push(UseRecord {
                    name: name.clone(),
                    qualifier: Some(qualifier.clone()),
                    import_path: path.to_string(),
                    position: position.clone(),
                    target: target_for(path, name),
                });
            }
            Reference::Bare { name, position } => {
                if dotted.is_empty() || local_names.contains(name.as_str()) {
                    continue;
                }
                let Some((path, target)) = dotted
                    .iter()
                    .find_map(|path| target_for(path, name).map(|t| (*path, t)))
                else {
                    continue;
                };
                uses.push(UseRecord {
                    name: name.clone(),
                    qualifier: None,
                    import_path: path.to_string(),
                    position: position.clone(),
                    target: Some(target),
                });
            }
        }
    }
}
