//! Graph Exploder
//!
//! Splits matching direct children of a content document into standalone
//! files, replacing them in the parent with include stubs. Processing is
//! best-effort per child: an "already exists" collision or a failed write
//! records an error and leaves that child in the parent verbatim, while the
//! rest of the batch continues.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::{
    ContentNode, ExplodedSummary, IncludeStub, Metadata, NodeChild, DEFAULT_NODE_TYPE,
    UNTITLED_NAME,
};
use crate::paths::{generate_include_path, normalize_path, resolve_output_path, PatternContext};
use crate::services::{BatchOutcome, EngineError};
use crate::store::{self, DocumentFormat};

/// Options controlling an explode operation
#[derive(Debug, Clone)]
pub struct ExplodeOptions {
    /// Node types to extract; empty means every direct child node
    pub types: Vec<String>,
    /// Output path template with `{type}`, `{name}`, `{id}`, `{index}`
    /// placeholders, resolved against the parent document's directory
    pub output_pattern: String,
    /// Serialization format for extracted files
    pub format: DocumentFormat,
    /// Report what would happen without touching the filesystem
    pub dry_run: bool,
    /// Write a `.backup` copy of the parent before overwriting it
    pub backup: bool,
    /// Overwrite existing output files instead of skipping the child
    pub force: bool,
}

impl Default for ExplodeOptions {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            output_pattern: "{type}s/{name}.codex".to_string(),
            format: DocumentFormat::Yaml,
            dry_run: false,
            backup: false,
            force: false,
        }
    }
}

/// Result of an explode operation.
///
/// A returned result means the operation as a whole succeeded; per-child
/// failures are surfaced in `errors` without aborting the batch. Structural
/// failures on the parent document surface as `Err` instead.
#[derive(Debug, Default)]
pub struct ExplodeResult {
    /// Output files written (or, for a dry run, that would be written)
    pub extracted_files: Vec<PathBuf>,
    /// Child id -> output file path for every successful extraction
    pub extraction_map: BTreeMap<String, PathBuf>,
    /// Per-child warnings and errors
    pub errors: Vec<String>,
}

impl ExplodeResult {
    pub fn extracted_count(&self) -> usize {
        self.extracted_files.len()
    }
}

/// A successfully extracted child, ready to be stubbed in the parent
struct Extracted {
    stub: IncludeStub,
    id: String,
    path: PathBuf,
}

/// Splits content-document children into standalone files
pub struct GraphExploder {
    options: ExplodeOptions,
}

impl GraphExploder {
    pub fn new(options: ExplodeOptions) -> Self {
        Self { options }
    }

    /// Explode the document at `document_path`.
    ///
    /// # Errors
    ///
    /// Returns an error only for structural failures on the parent: missing
    /// file, unparseable document, or no `children` array.
    pub fn explode(&self, document_path: &Path) -> Result<ExplodeResult, EngineError> {
        let document_path = normalize_path(document_path);
        let mut doc: ContentNode = store::load(&document_path)?;
        doc.validate_for_graph_ops()
            .map_err(|err| EngineError::structure(&document_path, err.to_string()))?;
        let children = doc.children.take().unwrap_or_default();
        let parent_dir = document_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut candidates = Vec::new();
        let mut remaining = Vec::new();
        for child in children {
            match child {
                NodeChild::Node(node) if self.matches_types(&node) => candidates.push(node),
                other => remaining.push(other),
            }
        }

        let mut outcome: BatchOutcome<Extracted, ContentNode> = BatchOutcome::default();
        for (ordinal, child) in candidates.into_iter().enumerate() {
            match self.extract_child(child, ordinal + 1, &document_path, &parent_dir, &doc) {
                Ok(extracted) => outcome.successes.push(extracted),
                Err((child, message)) => {
                    tracing::warn!("Skipping child during explode: {message}");
                    outcome.failures.push((child, message));
                }
            }
        }

        if !self.options.dry_run {
            let timestamp = chrono::Utc::now().to_rfc3339();
            let mut new_children: Vec<NodeChild> = outcome
                .successes
                .iter()
                .map(|extracted| NodeChild::Stub(extracted.stub.clone()))
                .collect();
            new_children.extend(
                outcome
                    .failures
                    .iter()
                    .map(|(child, _)| NodeChild::Node(child.clone())),
            );
            new_children.extend(remaining);
            doc.children = Some(new_children);

            let metadata = doc.metadata.get_or_insert_with(Metadata::default);
            metadata.updated = Some(timestamp.clone());
            metadata.exploded = Some(ExplodedSummary {
                timestamp,
                file_count: outcome.successes.len(),
                files: outcome
                    .successes
                    .iter()
                    .map(|extracted| extracted.stub.include.clone())
                    .collect(),
            });

            if self.options.backup {
                store::write_backup(&document_path)?;
            }
            store::save(&document_path, &doc)?;
        }

        tracing::debug!(
            "Exploded {}: {} extracted, {} failed{}",
            document_path.display(),
            outcome.successes.len(),
            outcome.failures.len(),
            if self.options.dry_run { " (dry run)" } else { "" },
        );

        let mut result = ExplodeResult {
            errors: outcome.error_messages(),
            ..Default::default()
        };
        for extracted in outcome.successes {
            result.extraction_map.insert(extracted.id, extracted.path.clone());
            result.extracted_files.push(extracted.path);
        }
        Ok(result)
    }

    fn matches_types(&self, node: &ContentNode) -> bool {
        self.options.types.is_empty()
            || self
                .options
                .types
                .iter()
                .any(|t| t == node.effective_type())
    }

    /// Extract one child into a standalone file.
    ///
    /// Failures hand the child back so the caller can keep it in the parent
    /// unmodified.
    fn extract_child(
        &self,
        child: ContentNode,
        ordinal: usize,
        source: &Path,
        parent_dir: &Path,
        parent: &ContentNode,
    ) -> Result<Extracted, (ContentNode, String)> {
        let id = child
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let ctx = PatternContext {
            node_type: child.effective_type(),
            name: child.display_name(),
            id: &id,
            index: ordinal,
        };
        let output =
            resolve_output_path(&self.options.output_pattern, &ctx, parent_dir, self.options.format);

        if output.exists() && !self.options.force && !self.options.dry_run {
            let message = EngineError::output_exists(&output).to_string();
            return Err((child, message));
        }

        let mut standalone = child.clone();
        standalone.metadata = Some(Metadata::for_standalone(
            source.display().to_string(),
            parent.metadata.as_ref(),
        ));
        standalone.id = Some(id.clone());
        if standalone.node_type.is_none() {
            standalone.node_type = Some(DEFAULT_NODE_TYPE.to_string());
        }
        if standalone.name.is_none() && standalone.title.is_none() {
            standalone.name = Some(UNTITLED_NAME.to_string());
        }

        if !self.options.dry_run {
            if let Err(err) = store::save(&output, &standalone) {
                return Err((child, err.to_string()));
            }
        }

        let stub = IncludeStub::new(generate_include_path(&output, parent_dir));
        Ok(Extracted {
            stub,
            id,
            path: output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_parent(dir: &Path) -> PathBuf {
        let path = dir.join("book.codex.yaml");
        let yaml = r#"
id: book-1
type: book
name: My Book
metadata:
  author: A. Writer
children:
  - id: ch-1
    type: chapter
    name: Chapter One
  - id: note-1
    type: note
    name: A Note
"#;
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_explode_filters_by_type() {
        let dir = TempDir::new().unwrap();
        let path = write_parent(dir.path());
        let exploder = GraphExploder::new(ExplodeOptions {
            types: vec!["chapter".to_string()],
            ..Default::default()
        });
        let result = exploder.explode(&path).unwrap();
        assert_eq!(result.extracted_count(), 1);
        assert!(result.errors.is_empty());
        assert!(result.extraction_map.contains_key("ch-1"));
        assert!(result.extracted_files[0].exists());

        // Note child stays as a real node, chapter becomes a stub
        let parent: ContentNode = store::load(&path).unwrap();
        let children = parent.children.unwrap();
        assert!(children[0].as_stub().is_some());
        assert_eq!(
            children[1].as_node().unwrap().id.as_deref(),
            Some("note-1")
        );
    }

    #[test]
    fn test_explode_inherits_author_into_standalone_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write_parent(dir.path());
        let exploder = GraphExploder::new(ExplodeOptions::default());
        let result = exploder.explode(&path).unwrap();
        assert_eq!(result.extracted_count(), 2);

        let standalone: ContentNode = store::load(&result.extraction_map["ch-1"]).unwrap();
        let metadata = standalone.metadata.unwrap();
        assert_eq!(metadata.author.as_deref(), Some("A. Writer"));
        assert_eq!(metadata.format_version.as_deref(), Some("1.0"));
        assert_eq!(
            metadata.extracted_from.as_deref(),
            Some(path.display().to_string().as_str())
        );
    }

    #[test]
    fn test_explode_missing_children_is_structural() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flat.codex.yaml");
        std::fs::write(&path, "id: x\ntype: note\n").unwrap();
        let exploder = GraphExploder::new(ExplodeOptions::default());
        assert!(matches!(
            exploder.explode(&path),
            Err(EngineError::Structure { .. })
        ));
    }

    #[test]
    fn test_explode_backup_written() {
        let dir = TempDir::new().unwrap();
        let path = write_parent(dir.path());
        let original = std::fs::read(&path).unwrap();
        let exploder = GraphExploder::new(ExplodeOptions {
            backup: true,
            ..Default::default()
        });
        exploder.explode(&path).unwrap();
        let backup = dir.path().join("book.codex.yaml.backup");
        assert_eq!(std::fs::read(backup).unwrap(), original);
    }

    #[test]
    fn test_explode_backfills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.codex.yaml");
        std::fs::write(&path, "id: d1\nchildren:\n  - body: some text\n").unwrap();
        let exploder = GraphExploder::new(ExplodeOptions::default());
        let result = exploder.explode(&path).unwrap();
        assert_eq!(result.extracted_count(), 1);

        let standalone: ContentNode = store::load(&result.extracted_files[0]).unwrap();
        assert!(standalone.id.is_some());
        assert_eq!(standalone.node_type.as_deref(), Some("node"));
        assert_eq!(standalone.name.as_deref(), Some("Untitled"));
        assert_eq!(standalone.body.as_deref(), Some("some text"));
    }
}
