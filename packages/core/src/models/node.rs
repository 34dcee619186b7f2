//! Content Document Structures
//!
//! This module defines the tree shape of codex content documents: arbitrary
//! authored hierarchies (chapters, characters, scenes, ...) whose `children`
//! sequences may mix real nodes with include stubs pointing at other files.
//!
//! # Include stubs
//!
//! On disk, an include stub is any object carrying exactly one key, a
//! string-valued `include`. There is no other marker. The [`NodeChild`]
//! union makes that structural decision once during deserialization, so the
//! rest of the engine matches on `Stub` / `Node` instead of re-inspecting
//! object shapes.
//!
//! # Examples
//!
//! ```rust
//! use codex_core::models::{ContentNode, NodeChild};
//!
//! let yaml = r#"
//! id: book-1
//! type: book
//! name: My Book
//! children:
//!   - include: /chapters/chapter-1.codex.yaml
//!   - id: ch-2
//!     type: chapter
//!     name: Chapter Two
//! "#;
//! let doc: ContentNode = serde_yaml::from_str(yaml).unwrap();
//! let children = doc.children.as_ref().unwrap();
//! assert!(matches!(children[0], NodeChild::Stub(_)));
//! assert!(matches!(children[1], NodeChild::Node(_)));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Fallback node type applied when a standalone document is missing one.
pub const DEFAULT_NODE_TYPE: &str = "node";

/// Fallback display name for nodes missing both `name` and `title`.
pub const UNTITLED_NAME: &str = "Untitled";

/// Validation errors for document structures
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Document has no children array")]
    MissingChildren,
}

/// A reference-only child: this position in `children` points at another file.
///
/// `deny_unknown_fields` is what makes the structural predicate exact: an
/// object with `include` plus any other key deserializes as a [`ContentNode`]
/// (with `include` landing in `extra`), not as a stub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeStub {
    pub include: String,
}

impl IncludeStub {
    pub fn new(include: impl Into<String>) -> Self {
        Self {
            include: include.into(),
        }
    }
}

/// Key/value attribute attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: Value,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Summary block recorded on a parent document after an explode operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplodedSummary {
    pub timestamp: String,
    pub file_count: usize,
    pub files: Vec<String>,
}

/// Summary block recorded on a parent document after an implode operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplodedSummary {
    pub timestamp: String,
    pub merged_count: usize,
}

/// Document metadata block.
///
/// `format_version`, `created` and `extracted_from` are standalone-only: they
/// exist on exploded files and are intentionally dropped again on implode.
/// Unknown keys round-trip through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploded: Option<ExplodedSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imploded: Option<ImplodedSummary>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Metadata {
    /// Metadata for a freshly extracted standalone document.
    ///
    /// `author` and `license` are inherited from the parent document's
    /// metadata when present.
    pub fn for_standalone(extracted_from: String, parent: Option<&Metadata>) -> Self {
        Self {
            format_version: Some("1.0".to_string()),
            created: Some(chrono::Utc::now().to_rfc3339()),
            extracted_from: Some(extracted_from),
            author: parent.and_then(|m| m.author.clone()),
            license: parent.and_then(|m| m.license.clone()),
            ..Default::default()
        }
    }
}

/// One element of a `children` sequence: a real node or an include stub.
///
/// The `Stub` variant is tried first; because [`IncludeStub`] rejects unknown
/// fields, only objects that are *exactly* `{ include: <string> }` match it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeChild {
    Stub(IncludeStub),
    Node(ContentNode),
}

impl NodeChild {
    pub fn as_stub(&self) -> Option<&IncludeStub> {
        match self {
            NodeChild::Stub(stub) => Some(stub),
            NodeChild::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&ContentNode> {
        match self {
            NodeChild::Node(node) => Some(node),
            NodeChild::Stub(_) => None,
        }
    }
}

/// A codex content node.
///
/// The same shape serves as a document root (the top-level mapping of a
/// `.codex.yaml` / `.codex.json` file) and as any nested child. `children`
/// distinguishes "absent" from "empty" because explode/implode treat a
/// document without a children array as a structural error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeChild>>,

    /// Unknown fields, preserved across explode/implode round trips
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ContentNode {
    /// Create a minimal node with a generated UUID
    pub fn new(node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            node_type: Some(node_type.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// The node's type, falling back to [`DEFAULT_NODE_TYPE`]
    pub fn effective_type(&self) -> &str {
        self.node_type.as_deref().unwrap_or(DEFAULT_NODE_TYPE)
    }

    /// Display name: `name`, then `title`, then [`UNTITLED_NAME`]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(UNTITLED_NAME)
    }

    /// Whether this document is an index document rather than content
    pub fn is_index(&self) -> bool {
        self.node_type.as_deref() == Some(crate::models::INDEX_TYPE)
    }

    /// Validate the node as a document root for explode/implode.
    ///
    /// Parse errors are caught earlier by the store; this only checks the
    /// structural requirement that a children array exists.
    pub fn validate_for_graph_ops(&self) -> Result<(), ValidationError> {
        if self.children.is_none() {
            return Err(ValidationError::MissingChildren);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stub_detection_exact_shape() {
        let child: NodeChild =
            serde_json::from_value(json!({ "include": "/chapters/one.codex.yaml" })).unwrap();
        assert!(matches!(child, NodeChild::Stub(_)));
    }

    #[test]
    fn test_stub_detection_rejects_extra_keys() {
        // include plus any other key is a content node, not a stub
        let child: NodeChild =
            serde_json::from_value(json!({ "include": "/a.yaml", "name": "A" })).unwrap();
        let node = child.as_node().expect("should parse as node");
        assert_eq!(node.extra.get("include"), Some(&json!("/a.yaml")));
    }

    #[test]
    fn test_stub_detection_rejects_non_string_include() {
        let child: NodeChild = serde_json::from_value(json!({ "include": 42 })).unwrap();
        assert!(matches!(child, NodeChild::Node(_)));
    }

    #[test]
    fn test_children_order_preserved() {
        let yaml = r#"
children:
  - include: /a.codex.yaml
  - id: n1
    type: scene
  - include: /b.codex.yaml
"#;
        let doc: ContentNode = serde_yaml::from_str(yaml).unwrap();
        let children = doc.children.unwrap();
        assert!(children[0].as_stub().is_some());
        assert!(children[1].as_node().is_some());
        assert!(children[2].as_stub().is_some());

        let out = serde_yaml::to_string(&ContentNode {
            children: Some(children),
            ..Default::default()
        })
        .unwrap();
        let round: ContentNode = serde_yaml::from_str(&out).unwrap();
        let round_children = round.children.unwrap();
        assert!(round_children[0].as_stub().is_some());
        assert!(round_children[2].as_stub().is_some());
    }

    #[test]
    fn test_missing_children_is_structural_error() {
        let doc: ContentNode = serde_yaml::from_str("id: x\ntype: book\n").unwrap();
        assert!(matches!(
            doc.validate_for_graph_ops(),
            Err(ValidationError::MissingChildren)
        ));

        let doc: ContentNode = serde_yaml::from_str("id: x\nchildren: []\n").unwrap();
        assert!(doc.validate_for_graph_ops().is_ok());
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let yaml = "id: n1\ntype: chapter\nsynopsis: a twist\nwordCount: 1200\n";
        let doc: ContentNode = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.extra.get("synopsis"), Some(&json!("a twist")));

        let out = serde_yaml::to_string(&doc).unwrap();
        let round: ContentNode = serde_yaml::from_str(&out).unwrap();
        assert_eq!(round.extra.get("wordCount"), Some(&json!(1200)));
    }

    #[test]
    fn test_metadata_for_standalone_inherits_author_license() {
        let parent = Metadata {
            author: Some("A. Writer".to_string()),
            license: Some("CC-BY".to_string()),
            ..Default::default()
        };
        let meta = Metadata::for_standalone("/book.codex.yaml".to_string(), Some(&parent));
        assert_eq!(meta.format_version.as_deref(), Some("1.0"));
        assert_eq!(meta.author.as_deref(), Some("A. Writer"));
        assert_eq!(meta.license.as_deref(), Some("CC-BY"));
        assert_eq!(meta.extracted_from.as_deref(), Some("/book.codex.yaml"));
        assert!(meta.created.is_some());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut node = ContentNode::default();
        assert_eq!(node.display_name(), "Untitled");
        node.title = Some("A Title".to_string());
        assert_eq!(node.display_name(), "A Title");
        node.name = Some("a-name".to_string());
        assert_eq!(node.display_name(), "a-name");
    }

    #[test]
    fn test_metadata_camel_case_wire_names() {
        let meta = Metadata {
            format_version: Some("1.0".to_string()),
            extracted_from: Some("/src.yaml".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert!(value.get("formatVersion").is_some());
        assert!(value.get("extractedFrom").is_some());
    }
}
