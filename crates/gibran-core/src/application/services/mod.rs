//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish the
//! high-level use cases: "scaffold a project" and "regenerate its brokers".

pub mod broker_service;
pub mod extract_service;
pub mod run_service;
pub mod scaffold_service;

pub use broker_service::BrokerSynthesizer;
pub use extract_service::{Extraction, SymbolExtractor};
pub use run_service::RunService;
pub use scaffold_service::{ScaffoldService, ScaffoldSummary};
