//! Document Store Error Types
//!
//! This module defines error types for on-disk document access, providing
//! clear error handling for missing files, malformed documents and plain
//! I/O failures.

use std::path::PathBuf;
use thiserror::Error;

/// Document store errors
///
/// Covers reading, parsing and writing serialized codex documents. Errors
/// about a document's *shape* (valid YAML/JSON but structurally unusable)
/// are handled by the service-layer error type.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested document does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The document exists but is not valid YAML/JSON for the target shape
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Failed to serialize a document for writing
    #[error("Failed to serialize document for {path}: {message}")]
    SerializeError { path: PathBuf, message: String },

    /// Underlying filesystem error
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a parse error
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a serialize error
    pub fn serialize_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SerializeError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
