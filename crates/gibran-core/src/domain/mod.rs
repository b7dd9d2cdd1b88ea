//! Core domain layer for Gibran.
//!
//! Pure data and rules: file roles, package records, the scaffold manifest,
//! broker views and diagnostics. All I/O, parsing and rendering happen
//! behind ports defined in the application layer.
//!
//! - **No I/O**: no filesystem, network or process environment access
//! - **Immutable entities**: records are built once and only read afterward
//! - **Rich domain model**: classification and ordering rules live on the entities

pub mod entities;
pub mod error;

mod validation;

pub use entities::{
    broker::{
        BrokerArtifact, BrokerSlot, BrokerView, DefinitionView, GENERATOR_NAME, ImportView,
        UseGroupView, UseView, is_generated_broker,
    },
    common::{Position, RelativePath, to_slash},
    diagnostics::{Diagnostic, ErrorKind, PackageOutcome, PackageStatus, RunReport, Severity},
    file_role::{FileRole, MarkerMatching, Markers, SOURCE_EXTENSION, SourceFile},
    manifest::{
        MANIFEST_VERSION, ManifestEntry, RenderContext, ScaffoldManifest, StubFile,
        validate_project_name,
    },
    package::{
        DefinitionKind, DefinitionRecord, ImportBinding, ImportRecord, PackageRecord, ParsedFile,
        ProjectContext, Reference, ResolvedPackage, ResolverConfig, UseRecord, UseTarget,
        choose_package_name, default_package_name, is_build_ignored, is_exported,
        parse_module_path,
    },
    project_structure::{DirectoryToCreate, FileToWrite, FsEntry, ProjectStructure},
};

pub use error::{DomainError, ErrorCategory};
pub use validation::DomainValidator;
