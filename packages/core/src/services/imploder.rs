//! Graph Imploder
//!
//! Resolves include stubs in a content document back into one merged tree.
//! Resolution is best-effort per stub: a missing or invalid target keeps the
//! original stub in place and records an error, while the rest of the
//! children continue to resolve. Include targets are confined to the owning
//! document's directory; a target that climbs out is rejected unread.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{ContentNode, ImplodedSummary, IncludeStub, Metadata, NodeChild};
use crate::paths::{is_contained, normalize_path, resolve_include_path};
use crate::services::EngineError;
use crate::store;

/// Options controlling an implode operation
#[derive(Debug, Clone, Default)]
pub struct ImplodeOptions {
    /// Report which files would be merged without writing anything
    pub dry_run: bool,
    /// Delete successfully merged source files after the parent write
    pub delete_source_files: bool,
    /// Write a `.backup` copy of the parent before overwriting it
    pub backup: bool,
    /// Also resolve stubs nested inside merged content and inside
    /// non-stub children
    pub recursive: bool,
    /// After deleting sources, remove their parent directories if empty
    pub delete_empty_folders: bool,
}

/// Result of an implode operation
#[derive(Debug, Default)]
pub struct ImplodeResult {
    /// Source files merged into the parent (or, for a dry run, that would be)
    pub merged_files: Vec<PathBuf>,
    /// Per-stub warnings and errors
    pub errors: Vec<String>,
}

impl ImplodeResult {
    pub fn merged_count(&self) -> usize {
        self.merged_files.len()
    }
}

/// Per-pass state for stub resolution
struct ImplodeContext {
    /// Files currently being resolved on this branch; guards against
    /// cyclic include chains in recursive mode
    resolving: HashSet<PathBuf>,
    merged: Vec<PathBuf>,
    errors: Vec<String>,
}

/// Resolves include stubs back into an in-memory merged tree
pub struct GraphImploder {
    options: ImplodeOptions,
}

impl GraphImploder {
    pub fn new(options: ImplodeOptions) -> Self {
        Self { options }
    }

    /// Implode the document at `document_path`.
    ///
    /// # Errors
    ///
    /// Returns an error only for structural failures on the parent: missing
    /// file, unparseable document, or no `children` array.
    pub fn implode(&self, document_path: &Path) -> Result<ImplodeResult, EngineError> {
        let document_path = normalize_path(document_path);
        let mut doc: ContentNode = store::load(&document_path)?;
        doc.validate_for_graph_ops()
            .map_err(|err| EngineError::structure(&document_path, err.to_string()))?;
        let children = doc.children.take().unwrap_or_default();
        let doc_dir = document_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut ctx = ImplodeContext {
            resolving: HashSet::from([document_path.clone()]),
            merged: Vec::new(),
            errors: Vec::new(),
        };
        doc.children = Some(self.resolve_children(children, &doc_dir, &doc_dir, &mut ctx));

        // Same file can be reached through two stubs; report it once
        let mut seen = HashSet::new();
        ctx.merged.retain(|path| seen.insert(path.clone()));

        tracing::debug!(
            "Imploded {}: {} merged, {} unresolved{}",
            document_path.display(),
            ctx.merged.len(),
            ctx.errors.len(),
            if self.options.dry_run { " (dry run)" } else { "" },
        );

        if self.options.dry_run {
            return Ok(ImplodeResult {
                merged_files: ctx.merged,
                errors: ctx.errors,
            });
        }

        let timestamp = chrono::Utc::now().to_rfc3339();
        let metadata = doc.metadata.get_or_insert_with(Metadata::default);
        metadata.exploded = None;
        metadata.updated = Some(timestamp.clone());
        metadata.imploded = Some(ImplodedSummary {
            timestamp,
            merged_count: ctx.merged.len(),
        });

        if self.options.backup {
            store::write_backup(&document_path)?;
        }
        store::save(&document_path, &doc)?;

        if self.options.delete_source_files {
            self.delete_sources(&ctx.merged, &mut ctx.errors);
        }

        Ok(ImplodeResult {
            merged_files: ctx.merged,
            errors: ctx.errors,
        })
    }

    fn resolve_children(
        &self,
        children: Vec<NodeChild>,
        base_dir: &Path,
        doc_dir: &Path,
        ctx: &mut ImplodeContext,
    ) -> Vec<NodeChild> {
        children
            .into_iter()
            .map(|child| match child {
                NodeChild::Stub(stub) => match self.resolve_stub(&stub, base_dir, doc_dir, ctx) {
                    Some(node) => NodeChild::Node(node),
                    // keep-on-failure: the stub stays where it was
                    None => NodeChild::Stub(stub),
                },
                NodeChild::Node(mut node) => {
                    if self.options.recursive {
                        if let Some(nested) = node.children.take() {
                            node.children =
                                Some(self.resolve_children(nested, base_dir, doc_dir, ctx));
                        }
                    }
                    NodeChild::Node(node)
                }
            })
            .collect()
    }

    fn resolve_stub(
        &self,
        stub: &IncludeStub,
        base_dir: &Path,
        doc_dir: &Path,
        ctx: &mut ImplodeContext,
    ) -> Option<ContentNode> {
        let target = normalize_path(&resolve_include_path(&stub.include, base_dir, doc_dir));

        if !is_contained(&target, doc_dir) {
            ctx.errors.push(EngineError::path_escape(&target).to_string());
            tracing::warn!("Rejected include escaping document root: {}", target.display());
            return None;
        }
        if ctx.resolving.contains(&target) {
            ctx.errors.push(
                EngineError::circular_reference(format!(
                    "'{}' is already being merged on this branch",
                    target.display()
                ))
                .to_string(),
            );
            return None;
        }
        if !target.exists() {
            ctx.errors.push(
                EngineError::unresolved_include(&stub.include, "target not found").to_string(),
            );
            return None;
        }

        let mut content: ContentNode = match store::load(&target) {
            Ok(content) => content,
            Err(err) => {
                ctx.errors
                    .push(EngineError::unresolved_include(&stub.include, err.to_string()).to_string());
                return None;
            }
        };
        if content.is_index() {
            ctx.errors.push(
                EngineError::unresolved_include(&stub.include, "target is an index document")
                    .to_string(),
            );
            return None;
        }

        // formatVersion/created/extractedFrom are standalone-only
        content.metadata = None;

        if self.options.recursive {
            if let Some(nested) = content.children.take() {
                let next_base = target.parent().unwrap_or(doc_dir).to_path_buf();
                ctx.resolving.insert(target.clone());
                content.children = Some(self.resolve_children(nested, &next_base, doc_dir, ctx));
                ctx.resolving.remove(&target);
            }
        }

        ctx.merged.push(target);
        Some(content)
    }

    /// Delete merged source files, then (optionally) their parent
    /// directories deepest-first where completely empty. Directory cleanup
    /// errors are swallowed, never fatal.
    fn delete_sources(&self, merged: &[PathBuf], errors: &mut Vec<String>) {
        let mut candidate_dirs = Vec::new();
        for path in merged {
            match fs::remove_file(path) {
                Ok(()) => {
                    if let Some(parent) = path.parent() {
                        candidate_dirs.push(parent.to_path_buf());
                    }
                }
                Err(err) => errors.push(format!("Failed to delete {}: {err}", path.display())),
            }
        }

        if self.options.delete_empty_folders {
            candidate_dirs.sort();
            candidate_dirs.dedup();
            candidate_dirs.sort_by_key(|dir| Reverse(dir.components().count()));
            for dir in candidate_dirs {
                let is_empty = fs::read_dir(&dir)
                    .map(|mut entries| entries.next().is_none())
                    .unwrap_or(false);
                if is_empty {
                    let _ = fs::remove_dir(&dir);
                }
            }
        }
    }
}
