//! Index Document Structures
//!
//! Index documents are a distinct codex kind (`type: index`) holding only
//! navigation metadata for a folder's contents: ordering, expansion state,
//! emoji/color styling and include stubs pointing at the folder's files or
//! at sub-folder index documents.
//!
//! Computed fields carry a leading underscore on the wire (`_filename`,
//! `_computed_path`, ...) and are only ever produced by resolution; explicit
//! authored fields are never overwritten by them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node::{Attribute, IncludeStub};

/// Document type tag identifying an index document
pub const INDEX_TYPE: &str = "index";

/// Per-type styling entry from an index document's `typeStyles` registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStyle {
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One element of an index `children` sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexChild {
    Stub(IncludeStub),
    Node(IndexNode),
}

impl IndexChild {
    pub fn as_node(&self) -> Option<&IndexNode> {
        match self {
            IndexChild::Node(node) => Some(node),
            IndexChild::Stub(_) => None,
        }
    }
}

/// A node in a (resolved) index tree.
///
/// Extends the content-node shape with navigation fields. The underscore
/// fields are computed during resolution:
///
/// - `_filename` - actual on-disk name; for a resolved sub-index this is the
///   *directory* name, never the declared display name, so composed paths
///   match the real filesystem layout
/// - `_computed_path` - path relative to the resolution root
/// - `_format` - serialization format of the backing file
/// - `_type_emoji` / `_type_color` - inherited from the owning document's
///   `typeStyles`, never overriding explicit `emoji` / `color`
/// - `_default_status` - `"private"` unless the node sets a status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<IndexChild>>,

    #[serde(
        rename = "_filename",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub filename: Option<String>,

    #[serde(
        rename = "_computed_path",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub computed_path: Option<String>,

    #[serde(rename = "_format", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(
        rename = "_type_emoji",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub type_emoji: Option<String>,

    #[serde(
        rename = "_type_color",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub type_color: Option<String>,

    #[serde(
        rename = "_default_status",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_status: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl IndexNode {
    /// Order value used for sibling sorting; unset orders sort as 0
    pub fn order_or_default(&self) -> f64 {
        self.order.unwrap_or(0.0)
    }

    /// Attribute lookup by key
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| &attr.value)
    }
}

/// A raw per-folder index document, identified by `type == "index"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(
        rename = "typeStyles",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub type_styles: Vec<TypeStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<IndexChild>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl IndexDocument {
    /// Whether the parsed document actually is an index document
    pub fn is_index(&self) -> bool {
        self.node_type.as_deref() == Some(INDEX_TYPE)
    }
}
