//! Batched render requests.

use std::collections::HashMap;

use crate::error::{ExportError, Result};
use crate::figma::DesignApi;
use crate::format::{validate_scale, ImageFormat, DEFAULT_SCALE};
use crate::types::ExportCandidate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub scale: f32,
    pub format: ImageFormat,
}

impl RenderOptions {
    pub fn new(scale: f32, format: ImageFormat) -> Result<Self> {
        let scale = validate_scale(scale).map_err(|e| ExportError::Config(e.to_string()))?;
        Ok(Self { scale, format })
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            format: ImageFormat::Png,
        }
    }
}

/// One candidate paired with the URL the render endpoint produced for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEntry {
    pub candidate: ExportCandidate,
    pub url: Option<String>,
}

/// Result of one batched render call, in selection order.
#[derive(Debug, Clone, Default)]
pub struct RenderBatch {
    pub entries: Vec<RenderEntry>,
}

impl RenderBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rendered(&self) -> usize {
        self.entries.iter().filter(|e| e.url.is_some()).count()
    }
}

/// Requests renders for all candidates in one remote call.
///
/// Fails without calling the API when `candidates` is empty. The response
/// must account for every requested id; a missing id fails the whole batch.
pub async fn request_renders<A>(
    api: &A,
    file_key: &str,
    candidates: &[ExportCandidate],
    options: &RenderOptions,
) -> Result<RenderBatch>
where
    A: DesignApi + ?Sized,
{
    if candidates.is_empty() {
        return Err(ExportError::NoCandidates(
            "no candidates to render".to_string(),
        ));
    }
    validate_scale(options.scale).map_err(|e| ExportError::Config(e.to_string()))?;

    let lookup: HashMap<&str, &ExportCandidate> =
        candidates.iter().map(|c| (c.id.as_str(), c)).collect();
    let node_ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();

    let mut urls = api
        .fetch_render_urls(file_key, &node_ids, options)
        .await
        .map_err(ExportError::render_request_from)?;

    let unknown: Vec<&String> = urls
        .keys()
        .filter(|id| !lookup.contains_key(id.as_str()))
        .collect();
    if !unknown.is_empty() {
        tracing::debug!(?unknown, "render response contains unrequested ids");
    }

    let mut missing = Vec::new();
    let mut entries = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match urls.remove(&candidate.id) {
            Some(url) => entries.push(RenderEntry {
                candidate: candidate.clone(),
                url: url.filter(|u| !u.is_empty()),
            }),
            None => missing.push(candidate.id.as_str()),
        }
    }

    if !missing.is_empty() {
        return Err(ExportError::render_request(format!(
            "render response is missing {} of {} requested nodes: {}",
            missing.len(),
            candidates.len(),
            missing.join(", ")
        )));
    }

    Ok(RenderBatch { entries })
}
