//! Application layer for Gibran.
//!
//! This layer contains:
//! - **Services**: use case orchestration (scaffold, extract, synthesize, run)
//! - **Ports**: interface definitions (traits) for external dependencies
//! - **Errors**: application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business rules itself. Those live in `crate::domain`.

pub mod cancel;
pub mod error;
pub mod ports;
pub mod services;

pub use cancel::CancellationFlag;
pub use services::{
    BrokerSynthesizer, Extraction, RunService, ScaffoldService, ScaffoldSummary, SymbolExtractor,
};

pub use ports::{
    BrokerRenderer, EntryKind, Filesystem, ImportResolver, PackageBatch, PackageSource,
    PackageStream, SourceParser,
};

pub use error::ApplicationError;
