//! File roles and the marker rules that assign them.
//!
//! A role is decided exactly once, when the walker first sees a file name.
//! Nothing downstream re-derives it from the name.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Extension of analysable source files.
pub const SOURCE_EXTENSION: &str = "go";

/// Suffix of test files, which belong to a separate package variant.
const TEST_SUFFIX: &str = "_test.go";

/// What part a source file plays in its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    /// Hand-written source; the only input to extraction.
    Regular,
    /// Delegate stub seeded at scaffold time; never read, never written.
    Generated,
    /// Broker facade; rewritten on every run.
    Broker,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Generated => write!(f, "generated"),
            Self::Broker => write!(f, "broker"),
        }
    }
}

/// How a marker is matched against a file stem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerMatching {
    /// Marker appears anywhere in the file name.
    #[default]
    Substring,
    /// Stem equals the marker or ends with `_<marker>`.
    Suffix,
}

/// Reserved filename markers for generated and broker files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    generated: String,
    broker: String,
    matching: MarkerMatching,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            generated: "@".into(),
            broker: "broker".into(),
            matching: MarkerMatching::Substring,
        }
    }
}

impl Markers {
    pub fn new(
        generated: impl Into<String>,
        broker: impl Into<String>,
        matching: MarkerMatching,
    ) -> Result<Self, DomainError> {
        let generated = generated.into();
        let broker = broker.into();

        if generated.is_empty() || broker.is_empty() {
            return Err(DomainError::InvalidMarker("markers cannot be empty".into()));
        }
        if generated == broker {
            return Err(DomainError::InvalidMarker(format!(
                "generated and broker markers are both '{generated}'"
            )));
        }
        if generated.contains(['/', '\\']) || broker.contains(['/', '\\']) {
            return Err(DomainError::InvalidMarker(
                "markers cannot contain path separators".into(),
            ));
        }

        Ok(Self {
            generated,
            broker,
            matching,
        })
    }

    pub fn generated(&self) -> &str {
        &self.generated
    }

    pub fn broker(&self) -> &str {
        &self.broker
    }

    pub fn matching(&self) -> MarkerMatching {
        self.matching
    }

    /// Canonical file name of a package's broker slot.
    pub fn broker_file_name(&self) -> String {
        format!("{}.{}", self.broker, SOURCE_EXTENSION)
    }

    /// Canonical file name of a package's delegate stub.
    pub fn generated_file_name(&self) -> String {
        format!("{}.{}", self.generated, SOURCE_EXTENSION)
    }

    /// Classify a file by name.
    ///
    /// Returns `None` for anything that is not an analysable source file
    /// (wrong extension, or a `_test.go` file). A name carrying both markers
    /// is `Generated`, so it can never become a write target.
    pub fn classify(&self, file_name: &str) -> Option<FileRole> {
        let stem = file_name.strip_suffix(&format!(".{SOURCE_EXTENSION}"))?;
        if stem.is_empty() || file_name.ends_with(TEST_SUFFIX) {
            return None;
        }

        if self.matches(stem, &self.generated) {
            Some(FileRole::Generated)
        } else if self.matches(stem, &self.broker) {
            Some(FileRole::Broker)
        } else {
            Some(FileRole::Regular)
        }
    }

    fn matches(&self, stem: &str, marker: &str) -> bool {
        match self.matching {
            MarkerMatching::Substring => stem.contains(marker),
            MarkerMatching::Suffix => stem == marker || stem.ends_with(&format!("_{marker}")),
        }
    }
}

/// One source file as seen by the walker.
///
/// The role is fixed at construction; there is no setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    name: String,
    role: FileRole,
    contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, role: FileRole, contents: impl Into<String>) -> Self {
        let path = path.into();
        let name = file_name_of(&path);
        Self {
            path,
            name,
            role,
            contents: contents.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bare file name, used as the `file` part of every [`Position`](super::Position).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> FileRole {
        self.role
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_markers_follow_original_layout() {
        let m = Markers::default();
        assert_eq!(m.classify("@.go"), Some(FileRole::Generated));
        assert_eq!(m.classify("broker.go"), Some(FileRole::Broker));
        assert_eq!(m.classify("user.go"), Some(FileRole::Regular));
    }

    #[test]
    fn non_source_files_are_unclassified() {
        let m = Markers::default();
        assert_eq!(m.classify("README.md"), None);
        assert_eq!(m.classify("go.mod"), None);
        assert_eq!(m.classify(".go"), None);
        assert_eq!(m.classify("user_test.go"), None);
    }

    #[test]
    fn substring_matching_catches_embedded_marker() {
        let m = Markers::default();
        assert_eq!(m.classify("mybroker_helper.go"), Some(FileRole::Broker));
    }

    #[test]
    fn suffix_matching_leaves_embedded_marker_regular() {
        let m = Markers::new("@", "broker", MarkerMatching::Suffix).unwrap();
        assert_eq!(m.classify("mybroker_helper.go"), Some(FileRole::Regular));
        assert_eq!(m.classify("models_broker.go"), Some(FileRole::Broker));
        assert_eq!(m.classify("broker.go"), Some(FileRole::Broker));
    }

    #[test]
    fn both_markers_resolve_to_generated() {
        let m = Markers::default();
        assert_eq!(m.classify("@broker.go"), Some(FileRole::Generated));
    }

    #[test]
    fn markers_must_be_distinct_and_non_empty() {
        assert!(Markers::new("", "broker", MarkerMatching::Substring).is_err());
        assert!(Markers::new("x", "x", MarkerMatching::Substring).is_err());
        assert!(Markers::new("a/b", "broker", MarkerMatching::Substring).is_err());
    }

    #[test]
    fn canonical_names() {
        let m = Markers::default();
        assert_eq!(m.broker_file_name(), "broker.go");
        assert_eq!(m.generated_file_name(), "@.go");
    }

    #[test]
    fn source_file_keeps_its_role() {
        let f = SourceFile::new("/p/models/user.go", FileRole::Regular, "package models");
        assert_eq!(f.name(), "user.go");
        assert_eq!(f.role(), FileRole::Regular);
    }
}
