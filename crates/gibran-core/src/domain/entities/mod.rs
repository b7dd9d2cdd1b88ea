pub mod broker;
pub mod common;
pub mod diagnostics;
pub mod file_role;
pub mod manifest;
pub mod package;
pub mod project_structure;

pub use crate::domain::DomainError;
pub use broker::{BrokerArtifact, BrokerSlot, BrokerView};
pub use diagnostics::{Diagnostic, ErrorKind, PackageOutcome, PackageStatus, RunReport, Severity};
pub use file_role::{FileRole, MarkerMatching, Markers, SourceFile};
pub use manifest::{RenderContext, ScaffoldManifest};
pub use package::{PackageRecord, ParsedFile, ProjectContext, ResolvedPackage};
pub use project_structure::ProjectStructure;
