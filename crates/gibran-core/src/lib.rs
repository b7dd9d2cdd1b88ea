//! Gibran Core - Hexagonal Architecture Implementation
//!
//! Domain and application layers for the Gibran project scaffolder and
//! broker generator, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           gibran-cli (CLI)              │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (ScaffoldService, RunService, ...)     │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Filesystem, PackageSource, Parser,     │
//! │  ImportResolver, BrokerRenderer)        │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    gibran-adapters (Infrastructure)     │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Markers, PackageRecord, BrokerView,    │
//! │  ScaffoldManifest, RunReport)           │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Pipeline
//!
//! `PackageSource` yields one batch per directory, `SymbolExtractor` turns
//! its Regular files into a `PackageRecord`, and `BrokerSynthesizer` renders
//! that record into the directory's broker slot. `RunService` drives the
//! three over a bounded worker pool and aggregates a `RunReport`.

pub mod application;
pub mod domain;
pub mod error;

/// Public API - what external crates should use.
pub mod prelude {
    pub use crate::application::{
        BrokerSynthesizer, CancellationFlag, RunService, ScaffoldService, ScaffoldSummary,
        SymbolExtractor,
        ports::{
            BrokerRenderer, EntryKind, Filesystem, ImportResolver, PackageBatch, PackageSource,
            SourceParser,
        },
    };
    pub use crate::domain::{
        Diagnostic, ErrorKind, FileRole, MarkerMatching, Markers, PackageRecord, PackageStatus,
        ResolverConfig, RunReport, ScaffoldManifest, Severity,
    };
    pub use crate::error::{GibranError, GibranResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
