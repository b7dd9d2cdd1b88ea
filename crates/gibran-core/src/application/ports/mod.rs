//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `gibran-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: file operations, including atomic replace
//!   - `PackageSource`: package discovery
//!   - `SourceParser`: per-file syntax extraction
//!   - `ImportResolver`: import path lookup
//!   - `BrokerRenderer`: broker text rendering
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    BrokerRenderer, EntryKind, Filesystem, ImportResolver, PackageBatch, PackageSource,
    PackageStream, SourceParser,
};

#[cfg(test)]
pub use output::{MockBrokerRenderer, MockFilesystem, MockImportResolver, MockSourceParser};
