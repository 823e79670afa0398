use thiserror::Error;
use url::Url;

use crate::types::DocumentReference;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("Invalid URL '{value}': {message}. Hint: include https:// and ensure the URL is well-formed.")]
    Malformed { value: String, message: String },
    #[error("Figma URL missing file key in '{url}'. Hint: use https://www.figma.com/file/<FILE_KEY>/...?node-id=<PAGE_ID>.")]
    MissingFileKey { url: String },
    #[error("Figma URL missing node-id in '{url}'. Hint: select the page in Figma and copy its link (e.g., ?node-id=1-2).")]
    MissingNodeId { url: String },
}

/// Path segments that precede the file key in document URLs.
const FILE_KEY_MARKERS: &[&str] = &["file", "design"];
const NODE_ID_PARAM: &str = "node-id";

/// Parses a document URL into its file key and target node id.
///
/// The node id is converted from the URL form (`1-2`) to the tree form (`1:2`).
pub fn extract_document_reference(value: &str) -> Result<DocumentReference, ReferenceError> {
    let url = Url::parse(value.trim()).map_err(|e| ReferenceError::Malformed {
        value: value.to_string(),
        message: e.to_string(),
    })?;

    let path_segments: Vec<&str> = url.path_segments().map(|c| c.collect()).unwrap_or_default();

    let file_key = path_segments
        .iter()
        .position(|s| FILE_KEY_MARKERS.contains(s))
        .and_then(|i| path_segments.get(i + 1))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| ReferenceError::MissingFileKey {
            url: value.to_string(),
        })?;

    let node_id = url
        .query_pairs()
        .find(|(k, _)| k == NODE_ID_PARAM)
        .map(|(_, v)| v.trim().replace('-', ":"))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ReferenceError::MissingNodeId {
            url: value.to_string(),
        })?;

    Ok(DocumentReference { file_key, node_id })
}
