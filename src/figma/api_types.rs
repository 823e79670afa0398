//! Figma API response types for parsing JSON from the Figma REST API.

use serde::Deserialize;
use std::collections::HashMap;

use crate::types::DocumentNode;

/// A Figma file response from the files endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub document: DocumentNode,
}

/// Response from the images export endpoint.
///
/// A `null` entry in `images` means the node failed to render server-side.
#[derive(Debug, Deserialize)]
pub struct FigmaImageExport {
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default)]
    pub images: HashMap<String, Option<String>>,
}

/// Error body shape shared by the REST endpoints (`err` or `message`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FigmaErrorBody {
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FigmaErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.err.or(self.message).filter(|m| !m.is_empty())
    }
}
