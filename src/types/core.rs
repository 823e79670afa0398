//! Core types used throughout the exporter.
//!
//! - [`DocumentReference`] - File key and target page parsed from a URL
//! - [`DocumentNode`] - One node of the fetched document tree
//! - [`ExportCandidate`] - A node selected for rendering

use serde::{Deserialize, Serialize};

/// Identifies the document and the page/node whose children are exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    /// File key taken from the `/file/<KEY>/` path segment
    pub file_key: String,
    /// Target node id in tree format (`1:2`)
    pub node_id: String,
}

/// A node of the document tree as returned by the files endpoint.
///
/// Only the fields the exporter reads are kept; everything else in the
/// payload is ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Node type such as `FRAME`, `GROUP`, `COMPONENT`
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<DocumentNode>) -> Self {
        self.children = children;
        self
    }
}

/// A node picked for rendering, detached from the tree it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCandidate {
    pub id: String,
    pub name: String,
}

impl From<&DocumentNode> for ExportCandidate {
    fn from(node: &DocumentNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
        }
    }
}
