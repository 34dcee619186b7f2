//! Index Resolver
//!
//! Composes a forest of per-folder index documents into one navigable tree.
//! Each stub child pointing at a canonical index filename becomes a folder
//! node whose subtree comes from recursively resolving the sub-index; any
//! other stub becomes a leaf node synthesized from its filename alone,
//! without reading the file.
//!
//! Cycles are detected, not thrown: a sub-index path already visited in the
//! current pass degrades to a skipped entry plus a warning. Missing
//! sub-index targets are likewise dropped with a warning, unlike the
//! imploder's keep-on-failure policy, so the resolved tree never carries
//! dangling stubs.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::models::{
    Attribute, IncludeStub, IndexChild, IndexDocument, IndexNode, TypeStyle, INDEX_TYPE,
};
use crate::paths::{humanize_filename, is_contained, normalize_path, resolve_include_path};
use crate::services::EngineError;
use crate::store::{self, is_index_filename, DocumentFormat};

/// Recursion ceiling for pathological (non-cyclic) index chains
const MAX_DEPTH: usize = 64;

/// Status assigned to nodes that do not set one
const DEFAULT_STATUS: &str = "private";

/// A fully resolved index tree plus the warnings gathered while building it
#[derive(Debug)]
pub struct ResolvedIndex {
    pub root: IndexNode,
    pub warnings: Vec<String>,
}

/// State threaded through one resolution pass.
///
/// The visited set is shared across the whole pass so cross-branch cycles
/// are caught, not just direct self-references.
struct ResolveContext {
    visited: HashSet<PathBuf>,
    root_dir: PathBuf,
    warnings: Vec<String>,
}

/// Per-document frame: where we are on disk and relative to the root
#[derive(Clone, Copy)]
struct Frame<'a> {
    /// Directory non-rooted include specs resolve against
    base_dir: &'a Path,
    /// Directory of the document owning the stubs being resolved
    doc_dir: &'a Path,
    /// `base_dir` relative to the resolution root, for `_computed_path`
    rel_base: &'a Path,
    depth: usize,
}

/// Resolves per-folder index documents into one navigable tree
#[derive(Debug, Default)]
pub struct IndexResolver;

impl IndexResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the index document at `path`.
    pub fn resolve_file(&self, path: &Path) -> Result<ResolvedIndex, EngineError> {
        let path = normalize_path(path);
        let text = store::read_text(&path)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        self.resolve_inner(&text, &dir, DocumentFormat::from_path(&path), Some(path))
    }

    /// Resolve raw index-document text located in the directory `dir`.
    pub fn resolve(
        &self,
        text: &str,
        dir: &Path,
        format: DocumentFormat,
    ) -> Result<ResolvedIndex, EngineError> {
        self.resolve_inner(text, &normalize_path(dir), format, None)
    }

    fn resolve_inner(
        &self,
        text: &str,
        dir: &Path,
        format: DocumentFormat,
        self_path: Option<PathBuf>,
    ) -> Result<ResolvedIndex, EngineError> {
        let pseudo_path = self_path
            .clone()
            .unwrap_or_else(|| dir.join(format!("index.codex.{}", format.extension())));
        let doc: IndexDocument = store::parse_document(text, format, &pseudo_path)?;
        if !doc.is_index() {
            return Err(EngineError::structure(
                &pseudo_path,
                format!(
                    "expected type '{INDEX_TYPE}', found '{}'",
                    doc.node_type.as_deref().unwrap_or("")
                ),
            ));
        }

        let mut ctx = ResolveContext {
            visited: HashSet::new(),
            root_dir: dir.to_path_buf(),
            warnings: Vec::new(),
        };
        // A self-reference inside the very file being parsed must be caught
        if let Some(path) = self_path {
            ctx.visited.insert(path);
        }

        let dir_name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let frame = Frame {
            base_dir: dir,
            doc_dir: dir,
            rel_base: Path::new(""),
            depth: 0,
        };
        let children = doc
            .children
            .clone()
            .map(|children| self.resolve_children(children, frame, &mut ctx));

        let mut root = IndexNode {
            id: doc.id.clone().or_else(|| dir_name.clone()),
            node_type: Some(INDEX_TYPE.to_string()),
            name: doc.name.clone().or(dir_name.clone()),
            title: doc.summary.clone(),
            emoji: doc.emoji.clone(),
            status: doc.status.clone(),
            filename: dir_name,
            format: Some(format.as_str().to_string()),
            children,
            ..Default::default()
        };

        Self::apply_styles(&mut root, &Self::style_map(&doc.type_styles));
        Self::apply_default_status(&mut root);

        Ok(ResolvedIndex {
            root,
            warnings: ctx.warnings,
        })
    }

    fn resolve_children(
        &self,
        children: Vec<IndexChild>,
        frame: Frame<'_>,
        ctx: &mut ResolveContext,
    ) -> Vec<IndexChild> {
        if frame.depth > MAX_DEPTH {
            ctx.warnings.push(format!(
                "Index nesting deeper than {MAX_DEPTH} levels under {}; not descending further",
                frame.base_dir.display()
            ));
            // Still no dangling stubs: unresolvable subtrees keep their
            // literal nodes only
            return children
                .into_iter()
                .filter_map(|child| match child {
                    IndexChild::Node(mut node) => {
                        Self::strip_stubs(&mut node);
                        Some(IndexChild::Node(node))
                    }
                    IndexChild::Stub(_) => None,
                })
                .collect();
        }

        let mut resolved = Vec::with_capacity(children.len());
        for child in children {
            match child {
                IndexChild::Stub(stub) => {
                    // Dropped-on-failure: a stub either resolves or vanishes
                    if let Some(node) = self.resolve_stub(&stub, frame, ctx) {
                        resolved.push(IndexChild::Node(node));
                    }
                }
                IndexChild::Node(node) => {
                    resolved.push(IndexChild::Node(self.descend(node, frame, ctx)));
                }
            }
        }
        resolved
    }

    /// Recurse into a literal (non-stub) child's own children, advancing the
    /// base by the node's `_filename` directory component, if any.
    fn descend(&self, mut node: IndexNode, frame: Frame<'_>, ctx: &mut ResolveContext) -> IndexNode {
        if let Some(children) = node.children.take() {
            let (next_base, next_rel);
            match node.filename.as_deref() {
                Some(filename) => {
                    next_base = frame.base_dir.join(filename);
                    next_rel = frame.rel_base.join(filename);
                }
                None => {
                    next_base = frame.base_dir.to_path_buf();
                    next_rel = frame.rel_base.to_path_buf();
                }
            }
            let next = Frame {
                base_dir: &next_base,
                doc_dir: frame.doc_dir,
                rel_base: &next_rel,
                depth: frame.depth + 1,
            };
            node.children = Some(self.resolve_children(children, next, ctx));
        }
        node
    }

    fn resolve_stub(
        &self,
        stub: &IncludeStub,
        frame: Frame<'_>,
        ctx: &mut ResolveContext,
    ) -> Option<IndexNode> {
        let filename = stub
            .include
            .rsplit('/')
            .next()
            .unwrap_or(stub.include.as_str())
            .to_string();

        if is_index_filename(&filename) {
            self.resolve_sub_index(stub, frame, ctx)
        } else {
            Some(Self::leaf_node(&filename, frame))
        }
    }

    /// Synthesize a leaf node from the include filename alone; the file's
    /// contents are never read.
    fn leaf_node(filename: &str, frame: Frame<'_>) -> IndexNode {
        IndexNode {
            node_type: Some("document".to_string()),
            name: Some(humanize_filename(filename)),
            filename: Some(filename.to_string()),
            computed_path: Some(posix_string(&frame.rel_base.join(filename))),
            format: Some(
                DocumentFormat::from_path(Path::new(filename))
                    .as_str()
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    fn resolve_sub_index(
        &self,
        stub: &IncludeStub,
        frame: Frame<'_>,
        ctx: &mut ResolveContext,
    ) -> Option<IndexNode> {
        let target = normalize_path(&resolve_include_path(
            &stub.include,
            frame.base_dir,
            frame.doc_dir,
        ));

        if !is_contained(&target, &ctx.root_dir) {
            ctx.warnings
                .push(EngineError::path_escape(&target).to_string());
            return None;
        }
        if ctx.visited.contains(&target) {
            ctx.warnings.push(
                EngineError::circular_reference(format!(
                    "sub-index '{}' already visited in this resolution pass",
                    target.display()
                ))
                .to_string(),
            );
            tracing::warn!("Circular sub-index reference: {}", target.display());
            return None;
        }
        // Before parsing, so a self-reference inside the target is caught too
        ctx.visited.insert(target.clone());

        if !target.exists() {
            ctx.warnings.push(
                EngineError::unresolved_include(&stub.include, "sub-index not found").to_string(),
            );
            return None;
        }
        let sub: IndexDocument = match store::load(&target) {
            Ok(sub) => sub,
            Err(err) => {
                ctx.warnings.push(
                    EngineError::unresolved_include(&stub.include, err.to_string()).to_string(),
                );
                return None;
            }
        };
        if !sub.is_index() {
            ctx.warnings.push(
                EngineError::unresolved_include(&stub.include, "target is not an index document")
                    .to_string(),
            );
            return None;
        }

        let sub_dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| frame.base_dir.to_path_buf());
        // The directory name, never the declared display name: composed
        // paths must match the real filesystem layout
        let dir_name = sub_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename_of(&target));
        // Root-relative, so an include spec with intermediate directories
        // keeps its full path; containment above guarantees the prefix holds
        let rel_path = sub_dir
            .strip_prefix(&ctx.root_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| frame.rel_base.join(&dir_name));

        let sub_frame_rel = rel_path.clone();
        let next = Frame {
            base_dir: &sub_dir,
            doc_dir: &sub_dir,
            rel_base: &sub_frame_rel,
            depth: frame.depth + 1,
        };
        let children = sub
            .children
            .clone()
            .map(|children| self.resolve_children(children, next, ctx));

        let mut attributes = Vec::new();
        if let Some(label) = sub.extra.get("scrivener_label") {
            attributes.push(Attribute::new("scrivener_label", label.clone()));
        }

        let mut folder = IndexNode {
            id: sub.id.clone().or_else(|| Some(dir_name.clone())),
            node_type: Some("folder".to_string()),
            name: sub.name.clone().or_else(|| Some(dir_name.clone())),
            title: sub.summary.clone(),
            emoji: sub.emoji.clone(),
            status: sub.status.clone(),
            attributes,
            filename: Some(dir_name),
            computed_path: Some(posix_string(&rel_path)),
            format: Some(DocumentFormat::from_path(&target).as_str().to_string()),
            children,
            ..Default::default()
        };

        // Each index document styles its own subtree with its own registry
        Self::apply_styles(&mut folder, &Self::style_map(&sub.type_styles));
        Some(folder)
    }

    fn style_map(styles: &[TypeStyle]) -> HashMap<&str, &TypeStyle> {
        styles
            .iter()
            .map(|style| (style.node_type.as_str(), style))
            .collect()
    }

    /// Pre-order style pass: purely additive and idempotent. Explicit
    /// `emoji`/`color` always win; an already-inherited value is never
    /// overwritten either.
    fn apply_styles(node: &mut IndexNode, styles: &HashMap<&str, &TypeStyle>) {
        if let Some(style) = node
            .node_type
            .as_deref()
            .and_then(|node_type| styles.get(node_type))
        {
            if node.emoji.is_none() && node.type_emoji.is_none() {
                node.type_emoji = style.emoji.clone();
            }
            if node.color.is_none() && node.type_color.is_none() {
                node.type_color = style.color.clone();
            }
        }
        if let Some(children) = node.children.as_mut() {
            for child in children {
                if let IndexChild::Node(child) = child {
                    Self::apply_styles(child, styles);
                }
            }
        }
    }

    /// Remove every stub from a subtree that will not be descended into
    fn strip_stubs(node: &mut IndexNode) {
        if let Some(children) = node.children.as_mut() {
            children.retain(|child| matches!(child, IndexChild::Node(_)));
            for child in children.iter_mut() {
                if let IndexChild::Node(child) = child {
                    Self::strip_stubs(child);
                }
            }
        }
    }

    /// Pre-order status pass: every node lacking a status gets
    /// `_default_status = "private"`. Additive and idempotent.
    fn apply_default_status(node: &mut IndexNode) {
        if node.status.is_none() && node.default_status.is_none() {
            node.default_status = Some(DEFAULT_STATUS.to_string());
        }
        if let Some(children) = node.children.as_mut() {
            for child in children {
                if let IndexChild::Node(child) = child {
                    Self::apply_default_status(child);
                }
            }
        }
    }
}

fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn posix_string(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, text: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_leaf_include_synthesized_without_reading() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.codex.yaml");
        // Note: the target file deliberately does not exist
        write(
            &index,
            "type: index\nname: Root\nchildren:\n  - include: my-chapter.codex.yaml\n",
        );

        let resolved = IndexResolver::new().resolve_file(&index).unwrap();
        assert!(resolved.warnings.is_empty());
        let children = resolved.root.children.unwrap();
        let leaf = children[0].as_node().unwrap();
        assert_eq!(leaf.node_type.as_deref(), Some("document"));
        assert_eq!(leaf.name.as_deref(), Some("My Chapter"));
        assert_eq!(leaf.filename.as_deref(), Some("my-chapter.codex.yaml"));
        assert_eq!(leaf.computed_path.as_deref(), Some("my-chapter.codex.yaml"));
        assert_eq!(leaf.format.as_deref(), Some("yaml"));
    }

    #[test]
    fn test_sub_index_filename_is_directory_name() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.codex.yaml");
        write(
            &index,
            "type: index\nname: Root\nchildren:\n  - include: chapters/index.codex.yaml\n",
        );
        write(
            &dir.path().join("chapters/index.codex.yaml"),
            "type: index\nname: Fancy Display Name\nchildren:\n  - include: one.codex.yaml\n",
        );

        let resolved = IndexResolver::new().resolve_file(&index).unwrap();
        let children = resolved.root.children.unwrap();
        let folder = children[0].as_node().unwrap();
        assert_eq!(folder.node_type.as_deref(), Some("folder"));
        assert_eq!(folder.name.as_deref(), Some("Fancy Display Name"));
        // _filename is the directory name, not the display name
        assert_eq!(folder.filename.as_deref(), Some("chapters"));
        assert_eq!(folder.computed_path.as_deref(), Some("chapters"));

        let nested = folder.children.as_ref().unwrap();
        let leaf = nested[0].as_node().unwrap();
        assert_eq!(leaf.computed_path.as_deref(), Some("chapters/one.codex.yaml"));
    }

    #[test]
    fn test_missing_sub_index_dropped_with_warning() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.codex.yaml");
        write(
            &index,
            "type: index\nchildren:\n  - include: gone/index.codex.yaml\n  - include: real.codex.yaml\n",
        );

        let resolved = IndexResolver::new().resolve_file(&index).unwrap();
        assert_eq!(resolved.warnings.len(), 1);
        assert!(resolved.warnings[0].contains("sub-index not found"));
        // The dangling stub is dropped, not retained
        assert_eq!(resolved.root.children.unwrap().len(), 1);
    }

    #[test]
    fn test_self_reference_terminates_with_warning() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.codex.yaml");
        write(
            &index,
            "type: index\nchildren:\n  - include: index.codex.yaml\n",
        );

        let resolved = IndexResolver::new().resolve_file(&index).unwrap();
        assert!(resolved
            .warnings
            .iter()
            .any(|warning| warning.contains("Circular reference")));
        assert!(resolved.root.children.unwrap().is_empty());
    }

    #[test]
    fn test_mutual_cycle_terminates_with_warning() {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join("a/index.codex.yaml"),
            "type: index\nchildren:\n  - include: ../b/index.codex.yaml\n",
        );
        write(
            &dir.path().join("b/index.codex.yaml"),
            "type: index\nchildren:\n  - include: ../a/index.codex.yaml\n",
        );
        // Resolve from the parent so both sub-indexes stay inside the root
        let root = dir.path().join("index.codex.yaml");
        write(
            &root,
            "type: index\nchildren:\n  - include: a/index.codex.yaml\n",
        );

        let resolved = IndexResolver::new().resolve_file(&root).unwrap();
        assert!(resolved
            .warnings
            .iter()
            .any(|warning| warning.contains("Circular reference")));
    }

    #[test]
    fn test_depth_ceiling_drops_stubs_keeps_literal_nodes() {
        let resolver = IndexResolver::new();
        let mut ctx = ResolveContext {
            visited: HashSet::new(),
            root_dir: PathBuf::from("/root"),
            warnings: Vec::new(),
        };
        let frame = Frame {
            base_dir: Path::new("/root"),
            doc_dir: Path::new("/root"),
            rel_base: Path::new(""),
            depth: MAX_DEPTH + 1,
        };
        let folder = IndexNode {
            name: Some("Folder".to_string()),
            children: Some(vec![IndexChild::Stub(IncludeStub::new("x.codex.yaml"))]),
            ..Default::default()
        };
        let children = vec![
            IndexChild::Stub(IncludeStub::new("index.codex.yaml")),
            IndexChild::Node(folder),
        ];

        let resolved = resolver.resolve_children(children, frame, &mut ctx);
        assert!(ctx
            .warnings
            .iter()
            .any(|warning| warning.contains("deeper than")));
        // Top-level stub gone, literal node kept with its nested stub gone too
        assert_eq!(resolved.len(), 1);
        let kept = resolved[0].as_node().unwrap();
        assert_eq!(kept.name.as_deref(), Some("Folder"));
        assert!(kept.children.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_non_index_document_is_structural_error() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.codex.yaml");
        write(&index, "type: book\nname: Not An Index\n");
        assert!(matches!(
            IndexResolver::new().resolve_file(&index),
            Err(EngineError::Structure { .. })
        ));
    }

    #[test]
    fn test_type_styles_do_not_override_explicit_fields() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.codex.yaml");
        write(
            &index,
            r##"type: index
typeStyles:
  - type: chapter
    emoji: "📖"
    color: "#cc8800"
children:
  - type: chapter
    name: Styled
  - type: chapter
    name: Explicit
    emoji: "🔥"
"##,
        );

        let resolved = IndexResolver::new().resolve_file(&index).unwrap();
        let children = resolved.root.children.unwrap();
        let styled = children[0].as_node().unwrap();
        assert_eq!(styled.type_emoji.as_deref(), Some("📖"));
        assert_eq!(styled.type_color.as_deref(), Some("#cc8800"));
        let explicit = children[1].as_node().unwrap();
        assert_eq!(explicit.emoji.as_deref(), Some("🔥"));
        assert!(explicit.type_emoji.is_none());
    }

    #[test]
    fn test_default_status_private_unless_set() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("index.codex.yaml");
        write(
            &index,
            "type: index\nchildren:\n  - type: chapter\n    name: A\n  - type: chapter\n    name: B\n    status: published\n",
        );

        let resolved = IndexResolver::new().resolve_file(&index).unwrap();
        let children = resolved.root.children.unwrap();
        assert_eq!(
            children[0].as_node().unwrap().default_status.as_deref(),
            Some("private")
        );
        assert!(children[1].as_node().unwrap().default_status.is_none());
    }
}
