//! Codex Core Engine
//!
//! This crate provides the decomposition/recomposition engine for "codex"
//! documents: hierarchical, typed content trees persisted as YAML/JSON files.
//!
//! # Architecture
//!
//! - **Explode**: split matching children of a content document into
//!   standalone files, replacing them with include stubs
//! - **Implode**: resolve include stubs back into one merged in-memory tree
//! - **Index resolution**: compose a forest of per-folder index files into a
//!   single navigable tree with type-based styling
//! - **Fractional ordering**: drag/drop order keys that never require
//!   renumbering unrelated siblings
//!
//! # Modules
//!
//! - [`models`] - Data structures (content documents, index documents)
//! - [`store`] - On-disk document store (YAML/JSON, backups)
//! - [`paths`] - Filename sanitization and include-path arithmetic
//! - [`ordering`] - Fractional sibling order calculation
//! - [`services`] - The explode/implode/index-resolution services

pub mod models;
pub mod ordering;
pub mod paths;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use models::*;
pub use ordering::{DropPosition, OrderCalculator};
pub use services::*;
pub use store::{DocumentFormat, StoreError};
