//! Per-unit failure records aggregated into a run report.

use std::fmt;

use serde::Serialize;

/// Closed failure taxonomy for files and packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    IoFailure,
    ParseFailure,
    UnresolvedImport,
    TemplateFailure,
    ConflictFailure,
}

impl ErrorKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::UnresolvedImport => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IoFailure => "IOFailure",
            Self::ParseFailure => "ParseFailure",
            Self::UnresolvedImport => "UnresolvedImport",
            Self::TemplateFailure => "TemplateFailure",
            Self::ConflictFailure => "ConflictFailure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One `(unit, kind, message)` entry.
///
/// `unit` is a `/`-separated path relative to the run root, naming either a
/// file or a package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub unit: String,
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(unit: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.unit, self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PackageStatus {
    /// Broker written to `broker` (relative to the run root).
    Synthesized { broker: String },
    /// No broker written.
    Failed,
    /// Not attempted because the run was cancelled.
    Skipped,
}

/// What happened to one package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutcome {
    pub directory: String,
    pub import_path: Option<String>,
    #[serde(flatten)]
    pub status: PackageStatus,
    pub diagnostics: Vec<Diagnostic>,
}

impl PackageOutcome {
    /// A unit failed if it was not synthesized or carries an error diagnostic.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, PackageStatus::Failed)
            || self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Aggregated result of one `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<PackageOutcome>,
    /// Directory read error that ended the walk early.
    pub walk_error: Option<Diagnostic>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.walk_error.is_some() || self.outcomes.iter().any(PackageOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn synthesized_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PackageStatus::Synthesized { .. }))
            .count()
    }

    /// Every diagnostic in report order, the walk error last.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.outcomes
            .iter()
            .flat_map(|o| o.diagnostics.iter())
            .chain(self.walk_error.iter())
    }
}
