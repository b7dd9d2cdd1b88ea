//! Infrastructure adapters for Gibran.
//!
//! This crate implements the ports defined in `gibran-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod filesystem;
pub mod parser;
pub mod renderer;
pub mod resolver;
pub mod walker;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use parser::GoParser;
pub use renderer::{DEFAULT_BROKER_TEMPLATE, TeraBrokerRenderer};
pub use resolver::CachingResolver;
pub use walker::PackageWalker;
