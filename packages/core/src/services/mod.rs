//! Graph Services
//!
//! The three operations over codex trees:
//!
//! - [`GraphExploder`] - split matching children into standalone files,
//!   replacing them with include stubs
//! - [`GraphImploder`] - resolve include stubs back into a merged tree
//! - [`IndexResolver`] - compose per-folder index documents into one
//!   navigable tree
//!
//! Batch item processing is best-effort throughout: a failure on one item
//! is recorded and processing continues with the next; only structural
//! failures on the root document abort an operation.

pub mod error;
pub mod exploder;
pub mod imploder;
pub mod index_resolver;

pub use error::EngineError;
pub use exploder::{ExplodeOptions, ExplodeResult, GraphExploder};
pub use imploder::{ImplodeOptions, ImplodeResult, GraphImploder};
pub use index_resolver::{IndexResolver, ResolvedIndex};

/// Outcome of a best-effort fold over batch items.
///
/// Failures keep the original item alongside the rendered error so callers
/// can put unprocessed items back where they came from.
#[derive(Debug)]
pub struct BatchOutcome<S, I> {
    pub successes: Vec<S>,
    pub failures: Vec<(I, String)>,
}

impl<S, I> Default for BatchOutcome<S, I> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<S, I> BatchOutcome<S, I> {
    /// Rendered error messages for the result's `errors` list
    pub fn error_messages(&self) -> Vec<String> {
        self.failures.iter().map(|(_, msg)| msg.clone()).collect()
    }
}
