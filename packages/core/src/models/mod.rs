//! Data Models
//!
//! This module contains the document shapes the engine operates on:
//!
//! - `ContentNode` / `NodeChild` - arbitrary authored content trees
//! - `IndexDocument` / `IndexNode` - per-folder navigation metadata trees
//!
//! Content and index documents share the include-stub mechanism: any object
//! whose only key is a string-valued `include` is a pointer to another file.
//! The stub-vs-node decision is made once at parse time via the tagged
//! `NodeChild` / `IndexChild` unions rather than repeated structural checks.

mod index;
mod node;

pub use index::{IndexChild, IndexDocument, IndexNode, TypeStyle, INDEX_TYPE};
pub use node::{
    Attribute, ContentNode, ExplodedSummary, ImplodedSummary, IncludeStub, Metadata, NodeChild,
    ValidationError, DEFAULT_NODE_TYPE, UNTITLED_NAME,
};
