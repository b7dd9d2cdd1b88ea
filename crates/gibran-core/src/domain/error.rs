// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (diagnostics are copied into run reports)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid file marker: {0}")]
    InvalidMarker(String),

    #[error("Duplicate path in manifest: {path}")]
    DuplicatePath { path: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    // ========================================================================
    // Layout Violations (409-level equivalent)
    // ========================================================================
    #[error("'{path}' is not a broker file and cannot be regenerated")]
    NotABrokerFile { path: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidMarker(msg) => vec![
                format!("Marker problem: {}", msg),
                "Set distinct, non-empty values for markers.generated and markers.broker".into(),
            ],
            Self::InvalidProjectName { name, reason } => vec![
                format!("Project name '{}' is invalid: {}", name, reason),
                "Use letters, digits, hyphens and underscores".into(),
                "Examples: myapp, my-service, shop_api".into(),
            ],
            Self::NotABrokerFile { path } => vec![
                format!("Refusing to overwrite hand-authored file: {}", path),
                "Broker files must carry the broker marker in their name".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidManifest(_)
            | Self::DuplicatePath { .. }
            | Self::AbsolutePathNotAllowed { .. } => ErrorCategory::Internal,
            Self::InvalidMarker(_) | Self::InvalidProjectName { .. } => ErrorCategory::Validation,
            Self::NotABrokerFile { .. } => ErrorCategory::Conflict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Internal,
}
