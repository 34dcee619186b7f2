//! Engine Error Types
//!
//! Structural errors on the *root* document of an operation abort the whole
//! operation and surface as `Err`. Everything else is per-item: caught,
//! rendered into the result's `errors` list, and never allowed to abort
//! sibling processing.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised by the explode/implode/index-resolution services
#[derive(Error, Debug)]
pub enum EngineError {
    /// Root document could not be read or parsed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Document parsed but is structurally unusable (wrong kind, missing
    /// `children`, ...)
    #[error("Invalid document structure in {path}: {message}")]
    Structure { path: PathBuf, message: String },

    /// Output target already exists and `force` was not set
    #[error("Output already exists: {path}")]
    OutputExists { path: PathBuf },

    /// A sub-index includes itself, directly or through another index
    #[error("Circular reference: {context}")]
    CircularReference { context: String },

    /// An include stub's target is missing or not a usable document
    #[error("Unresolved include '{include}': {reason}")]
    UnresolvedInclude { include: String, reason: String },

    /// An include target escapes the owning document's root
    #[error("Include target escapes the document root: {path}")]
    PathEscape { path: PathBuf },
}

impl EngineError {
    /// Create a structure error
    pub fn structure(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Structure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an output-exists error
    pub fn output_exists(path: impl Into<PathBuf>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Create a circular reference error
    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }

    /// Create an unresolved include error
    pub fn unresolved_include(include: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvedInclude {
            include: include.into(),
            reason: reason.into(),
        }
    }

    /// Create a path escape error
    pub fn path_escape(path: impl Into<PathBuf>) -> Self {
        Self::PathEscape { path: path.into() }
    }
}
