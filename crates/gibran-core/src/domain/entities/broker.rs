//! Broker slot and the view a broker template renders from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::file_role::{FileRole, Markers, file_name_of};
use super::package::PackageRecord;
use crate::domain::error::DomainError;

/// Name written into every broker header.
pub const GENERATOR_NAME: &str = "gibran";

/// The one file in a package directory the synthesizer may write.
///
/// Can only be constructed for a name the markers classify as
/// [`FileRole::Broker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSlot {
    path: PathBuf,
}

impl BrokerSlot {
    pub fn new(path: impl Into<PathBuf>, markers: &Markers) -> Result<Self, DomainError> {
        let path = path.into();
        match markers.classify(&file_name_of(&path)) {
            Some(FileRole::Broker) => Ok(Self { path }),
            _ => Err(DomainError::NotABrokerFile {
                path: path.display().to_string(),
            }),
        }
    }

    /// Pick the slot for `dir`: the single previously generated broker if
    /// there is exactly one, otherwise the canonical broker file name.
    ///
    /// `generated_brokers` holds only broker-classified files that carry the
    /// header checked by [`is_generated_broker`]; hand-written lookalikes are
    /// never chosen.
    pub fn resolve(
        dir: &Path,
        generated_brokers: &[PathBuf],
        markers: &Markers,
    ) -> Result<Self, DomainError> {
        match generated_brokers {
            [only] => Self::new(only.clone(), markers),
            _ => Self::new(dir.join(markers.broker_file_name()), markers),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether `contents` carries the header line of a broker written by this
/// tool, ahead of the package clause.
pub fn is_generated_broker(contents: &str) -> bool {
    let header = format!("// Code generated by {GENERATOR_NAME}");
    contents
        .lines()
        .take_while(|line| !line.starts_with("package "))
        .any(|line| line.starts_with(&header))
}

/// Rendered broker text for one package. Replaced wholesale on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerArtifact {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportView {
    pub path: String,
    /// Explicit aliases this path is imported under, sorted.
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionView {
    pub name: String,
    pub kind: String,
    pub receiver: Option<String>,
    pub exported: bool,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UseView {
    pub name: String,
    pub qualifier: Option<String>,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UseGroupView {
    pub import_path: String,
    /// Resolved package name, or the conventional default when unresolved.
    pub package: String,
    pub resolved: bool,
    pub uses: Vec<UseView>,
}

/// Everything a broker template can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerView {
    pub generator: String,
    pub source_path: String,
    pub package_name: String,
    pub import_path: String,
    pub imports: Vec<ImportView>,
    pub definitions: Vec<DefinitionView>,
    pub use_groups: Vec<UseGroupView>,
    pub unresolved_imports: Vec<String>,
}

impl BrokerView {
    pub fn from_record(record: &PackageRecord) -> Self {
        let mut imports: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for import in record.imports() {
            let aliases = imports.entry(import.path.as_str()).or_default();
            if let Some(alias) = &import.alias {
                if !aliases.contains(alias) {
                    aliases.push(alias.clone());
                }
            }
        }

        let mut groups: BTreeMap<&str, UseGroupView> = BTreeMap::new();
        for u in record.uses() {
            let group = groups
                .entry(u.import_path.as_str())
                .or_insert_with(|| UseGroupView {
                    import_path: u.import_path.clone(),
                    package: u
                        .target
                        .as_ref()
                        .map(|t| t.package.clone())
                        .unwrap_or_else(|| super::package::default_package_name(&u.import_path)),
                    resolved: u.target.is_some(),
                    uses: Vec::new(),
                });
            group.uses.push(UseView {
                name: u.name.clone(),
                qualifier: u.qualifier.clone(),
                location: u.position.to_string(),
            });
        }

        Self {
            generator: GENERATOR_NAME.to_string(),
            source_path: record.directory().to_string(),
            package_name: record.name().to_string(),
            import_path: record.import_path().to_string(),
            imports: imports
                .into_iter()
                .map(|(path, mut aliases)| {
                    aliases.sort();
                    ImportView {
                        path: path.to_string(),
                        aliases,
                    }
                })
                .collect(),
            definitions: record
                .definitions()
                .iter()
                .map(|d| DefinitionView {
                    name: d.name.clone(),
                    kind: d.kind.to_string(),
                    receiver: d.receiver.clone(),
                    exported: d.is_exported(),
                    location: d.position.to_string(),
                })
                .collect(),
            use_groups: groups.into_values().collect(),
            unresolved_imports: record.unresolved_imports().to_vec(),
        }
    }
}
