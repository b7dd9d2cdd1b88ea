use crate::domain::{
    entities::{ProjectStructure, ScaffoldManifest, manifest::validate_project_name},
    error::DomainError,
};

/// Centralized domain validation.
///
/// Entry points call these before touching the filesystem.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_project_name(name: &str) -> Result<(), DomainError> {
        validate_project_name(name)
    }

    pub fn validate_manifest(manifest: &ScaffoldManifest) -> Result<(), DomainError> {
        manifest.validate()
    }

    pub fn validate_project_structure(structure: &ProjectStructure) -> Result<(), DomainError> {
        structure.validate()
    }
}
