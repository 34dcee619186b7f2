//! Document persistence
//!
//! Codex documents live on disk as YAML or JSON, interchangeable by
//! extension. This module is the only place that touches serialization and
//! the filesystem; services above it deal in parsed trees.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::StoreError;

/// Canonical filenames identifying a per-folder index document
pub const INDEX_FILENAMES: [&str; 4] = [
    "index.codex.yaml",
    ".index.codex.yaml",
    "index.codex.json",
    ".index.codex.json",
];

/// Suffix appended to a file's path for its pre-write backup copy
pub const BACKUP_SUFFIX: &str = ".backup";

/// Serialization format of a codex document, detected from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Detect the format from a path's extension; unknown extensions
    /// default to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    /// Preferred file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
        }
    }

    /// Short name used for the `_format` computed field
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
        }
    }
}

/// Whether `filename` is one of the canonical index document filenames
pub fn is_index_filename(filename: &str) -> bool {
    INDEX_FILENAMES.contains(&filename)
}

/// Read a document file into a string
pub fn read_text(path: &Path) -> Result<String, StoreError> {
    if !path.exists() {
        return Err(StoreError::file_not_found(path));
    }
    fs::read_to_string(path).map_err(|err| StoreError::io(path, err))
}

/// Parse document text in the given format
pub fn parse_document<T: DeserializeOwned>(
    text: &str,
    format: DocumentFormat,
    path: &Path,
) -> Result<T, StoreError> {
    match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text)
            .map_err(|err| StoreError::parse_error(path, err.to_string())),
        DocumentFormat::Json => serde_json::from_str(text)
            .map_err(|err| StoreError::parse_error(path, err.to_string())),
    }
}

/// Load and parse a document, detecting the format from the extension
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = read_text(path)?;
    parse_document(&text, DocumentFormat::from_path(path), path)
}

/// Serialize a document in the given format
pub fn to_text<T: Serialize>(
    document: &T,
    format: DocumentFormat,
    path: &Path,
) -> Result<String, StoreError> {
    match format {
        DocumentFormat::Yaml => serde_yaml::to_string(document)
            .map_err(|err| StoreError::serialize_error(path, err.to_string())),
        DocumentFormat::Json => serde_json::to_string_pretty(document)
            .map_err(|err| StoreError::serialize_error(path, err.to_string())),
    }
}

/// Serialize and write a document, creating parent directories as needed.
///
/// The format is detected from the target path's extension.
pub fn save<T: Serialize>(path: &Path, document: &T) -> Result<(), StoreError> {
    let text = to_text(document, DocumentFormat::from_path(path), path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
    }
    fs::write(path, text).map_err(|err| StoreError::io(path, err))
}

/// Write a byte-for-byte `<path>.backup` copy of an existing file.
///
/// Taken immediately before the first mutating write of an operation.
pub fn write_backup(path: &Path) -> Result<PathBuf, StoreError> {
    let mut backup = path.as_os_str().to_owned();
    backup.push(BACKUP_SUFFIX);
    let backup = PathBuf::from(backup);
    fs::copy(path, &backup).map_err(|err| StoreError::io(path, err))?;
    tracing::debug!("Wrote backup copy {}", backup.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentNode;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.codex.yaml")),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.codex.json")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.yml")),
            DocumentFormat::Yaml
        );
        // Unknown extensions default to YAML
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b")),
            DocumentFormat::Yaml
        );
    }

    #[test]
    fn test_index_filename_detection() {
        assert!(is_index_filename("index.codex.yaml"));
        assert!(is_index_filename(".index.codex.yaml"));
        assert!(is_index_filename("index.codex.json"));
        assert!(is_index_filename(".index.codex.json"));
        assert!(!is_index_filename("chapter-1.codex.yaml"));
        assert!(!is_index_filename("index.yaml"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result: Result<ContentNode, _> = load(&dir.path().join("missing.codex.yaml"));
        assert!(matches!(result, Err(StoreError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.codex.yaml");
        std::fs::write(&path, "children: [unclosed").unwrap();
        let result: Result<ContentNode, _> = load(&path);
        assert!(matches!(result, Err(StoreError::ParseError { .. })));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.codex.yaml");
        let node = ContentNode::new("chapter", "One");
        save(&path, &node).unwrap();
        let loaded: ContentNode = load(&path).unwrap();
        assert_eq!(loaded.name.as_deref(), Some("One"));
    }

    #[test]
    fn test_save_json_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.codex.json");
        save(&path, &ContentNode::new("scene", "S1")).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('{'));
    }

    #[test]
    fn test_write_backup_is_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.codex.yaml");
        std::fs::write(&path, "id: original\n").unwrap();
        let backup = write_backup(&path).unwrap();
        assert_eq!(backup, dir.path().join("doc.codex.yaml.backup"));
        assert_eq!(std::fs::read(&path).unwrap(), std::fs::read(&backup).unwrap());
    }
}
