//! Unified error handling for Gibran Core.
//!
//! Wraps domain and application errors behind one type with suggestions,
//! a display category and a mapping onto the per-unit [`ErrorKind`] taxonomy.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, ErrorKind};

/// Root error type for Gibran Core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GibranError {
    /// Errors from the domain layer (business rule violations).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (orchestration and I/O failures).
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl GibranError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Run `gibran config list` to inspect the effective configuration".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in Gibran".into(),
                "Please report this issue at: https://github.com/jochasinga/gibran/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Conflict => ErrorCategory::Conflict,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Diagnostic kind used when this error is attached to a file or package.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Application(ApplicationError::ParseFailed { .. }) => ErrorKind::ParseFailure,
            Self::Application(ApplicationError::UnresolvedImport { .. }) => {
                ErrorKind::UnresolvedImport
            }
            Self::Application(ApplicationError::RenderingFailed { .. }) => {
                ErrorKind::TemplateFailure
            }
            Self::Application(ApplicationError::Conflict { .. })
            | Self::Domain(DomainError::NotABrokerFile { .. }) => ErrorKind::ConflictFailure,
            _ => ErrorKind::IoFailure,
        }
    }

    /// Message without the layer prefix, for diagnostics.
    pub fn detail(&self) -> String {
        match self {
            Self::Domain(e) => e.to_string(),
            Self::Application(e) => e.to_string(),
            Self::Configuration { message } | Self::Internal { message } => message.clone(),
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type GibranResult<T> = Result<T, GibranError>;

/// Extension trait for adding context to foreign errors.
pub trait Context<T> {
    fn context(self, msg: impl Into<String>) -> GibranResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> GibranResult<T> {
        self.map_err(|e| GibranError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn kinds_map_onto_diagnostic_taxonomy() {
        let parse: GibranError = ApplicationError::ParseFailed {
            file: "a.go".into(),
            message: "x".into(),
        }
        .into();
        assert_eq!(parse.kind(), ErrorKind::ParseFailure);

        let io: GibranError = ApplicationError::FilesystemError {
            path: PathBuf::from("a.go"),
            reason: "denied".into(),
        }
        .into();
        assert_eq!(io.kind(), ErrorKind::IoFailure);

        let slot: GibranError = DomainError::NotABrokerFile {
            path: "user.go".into(),
        }
        .into();
        assert_eq!(slot.kind(), ErrorKind::ConflictFailure);
    }

    #[test]
    fn detail_drops_layer_prefix() {
        let e: GibranError = ApplicationError::RenderingFailed {
            reason: "bad".into(),
        }
        .into();
        assert_eq!(e.detail(), "Template rendering failed: bad");
        assert_eq!(e.kind(), ErrorKind::TemplateFailure);
    }

    #[test]
    fn categories_flow_through() {
        let e: GibranError = ApplicationError::NotFound {
            path: PathBuf::from("/nope"),
        }
        .into();
        assert_eq!(e.category(), ErrorCategory::NotFound);
        let e: GibranError = DomainError::InvalidMarker("x".into()).into();
        assert_eq!(e.category(), ErrorCategory::Validation);
    }
}
