//! Picks the nodes to export from a fetched document tree.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};

use crate::error::{ExportError, Result};
use crate::types::{DocumentNode, ExportCandidate};

pub const DEFAULT_NODE_TYPE: &str = "FRAME";

/// Which children of the target page are exported.
#[derive(Debug, Clone)]
pub struct NodeFilter {
    node_types: BTreeSet<String>,
    ignore_name: Option<Regex>,
}

impl Default for NodeFilter {
    fn default() -> Self {
        Self {
            node_types: BTreeSet::from([DEFAULT_NODE_TYPE.to_string()]),
            ignore_name: None,
        }
    }
}

impl NodeFilter {
    /// Builds a filter from a comma-separated type list and an optional
    /// ignore pattern (a regular expression searched in node names).
    pub fn parse(node_types: &str, ignore_name: Option<&str>) -> Result<Self> {
        let mut types: BTreeSet<String> = node_types
            .split(',')
            .map(|t| t.trim().to_ascii_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        if types.is_empty() {
            types.insert(DEFAULT_NODE_TYPE.to_string());
        }

        let ignore_name = ignore_name
            .filter(|p| !p.is_empty())
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ExportError::Config(format!("invalid ignore-node-name pattern '{p}': {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            node_types: types,
            ignore_name,
        })
    }

    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.node_types.iter().map(String::as_str)
    }

    pub fn accepts(&self, node: &DocumentNode) -> bool {
        self.node_types.contains(&node.node_type) && !self.is_ignored(&node.name)
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore_name
            .as_ref()
            .map_or(false, |pattern| pattern.is_match(name))
    }
}

/// Returns the accepted children of every root child whose id is `target_id`.
///
/// Ids should be unique, but when several root children share the target id
/// their children are concatenated in tree order. A child id seen under more
/// than one matching page is kept once, at its first position.
pub fn select_candidates(
    root: &DocumentNode,
    target_id: &str,
    filter: &NodeFilter,
) -> Vec<ExportCandidate> {
    let mut seen = HashSet::new();
    let candidates: Vec<ExportCandidate> = root
        .children
        .iter()
        .filter(|page| page.id == target_id)
        .flat_map(|page| page.children.iter())
        .filter(|child| filter.accepts(child))
        .filter(|child| seen.insert(child.id.as_str()))
        .map(ExportCandidate::from)
        .collect();

    tracing::debug!(
        target_id,
        selected = candidates.len(),
        "selected export candidates"
    );
    candidates
}
