//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not business
//! rules. Business rule violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while scaffolding, extracting or synthesizing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// Broker template failed to compile or render.
    #[error("Template rendering failed: {reason}")]
    RenderingFailed { reason: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Path required by the operation does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Existing entry has a different shape than the one expected.
    #[error("Conflict at {path}: expected {expected}, found {found}")]
    Conflict {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// Source file could not be parsed.
    #[error("Parse error in {file}: {message}")]
    ParseFailed { file: String, message: String },

    /// Import path could not be located by the resolver.
    #[error("Unresolved import \"{import_path}\": {reason}")]
    UnresolvedImport { import_path: String, reason: String },

    /// Shared state lock was poisoned by a panicking thread.
    #[error("Internal lock poisoned")]
    LockPoisoned,

    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Rollback failed (best-effort cleanup failed).
    #[error("Rollback failed for {path}: {reason}")]
    RollbackFailed { path: PathBuf, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::RenderingFailed { .. } => vec![
                "Check the broker template for syntax errors or unknown fields".into(),
                "Unset run.broker_template to fall back to the built-in template".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
            Self::NotFound { path } => vec![
                format!("Nothing at: {}", path.display()),
                "Pass an existing project directory".into(),
            ],
            Self::Conflict {
                path,
                expected,
                found,
            } => vec![
                format!("{} is a {} but the layout needs a {}", path.display(), found, expected),
                "Move the conflicting entry aside and scaffold again".into(),
            ],
            Self::UnresolvedImport { .. } => vec![
                "Add the module root to resolver.search_paths".into(),
                "Or set resolver.goroot for standard library packages".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::ValidationFailed(_) | Self::ParseFailed { .. } => ErrorCategory::Validation,
            Self::UnresolvedImport { .. } => ErrorCategory::NotFound,
            Self::FilesystemError { .. }
            | Self::RollbackFailed { .. }
            | Self::LockPoisoned
            | Self::RenderingFailed { .. } => ErrorCategory::Internal,
        }
    }
}
