//! Figma REST API integration.
//!
//! This module provides:
//! - [`DesignApi`] - The two remote calls the export pipeline needs
//! - [`FigmaClient`] - reqwest implementation against api.figma.com
//! - API types for parsing Figma JSON responses

pub mod api_types;
pub mod client;


pub use api_types::{FigmaFile, FigmaImageExport};
pub use client::{FigmaAuth, FigmaClient, FigmaError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

use async_trait::async_trait;
use std::collections::HashMap;

use crate::render::RenderOptions;
use crate::types::DocumentNode;

/// Node id to render URL; `None` when the node failed to render.
pub type RenderUrls = HashMap<String, Option<String>>;

/// Remote design API as seen by the exporter.
#[async_trait]
pub trait DesignApi: Send + Sync {
    /// Fetches the full document tree of a file.
    async fn fetch_document_tree(&self, file_key: &str) -> Result<DocumentNode, FigmaError>;

    /// Requests render URLs for all `node_ids` in a single call.
    async fn fetch_render_urls(
        &self,
        file_key: &str,
        node_ids: &[String],
        options: &RenderOptions,
    ) -> Result<RenderUrls, FigmaError>;
}
