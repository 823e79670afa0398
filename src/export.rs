//! Runs the whole export: URL → tree → selection → render → files.

use tokio_util::sync::CancellationToken;

use crate::config::ExportSettings;
use crate::error::{ExportError, Result};
use crate::figma::{DesignApi, FigmaClient};
use crate::persist::persist_all;
use crate::reference::extract_document_reference;
use crate::render::request_renders;
use crate::selector::select_candidates;
use crate::storage::{HttpImageStore, ImageStore};
use crate::types::ExportReport;

/// Sequences the pipeline over a remote API and an image store.
#[derive(Debug, Clone)]
pub struct Exporter<A, S> {
    api: A,
    store: S,
}

impl Exporter<FigmaClient, HttpImageStore> {
    /// Builds the HTTP-backed exporter described by `settings`.
    pub fn from_settings(settings: &ExportSettings) -> Result<Self> {
        settings.validate()?;
        let api = FigmaClient::with_base_url_and_timeout(
            settings.auth.clone(),
            &settings.api_base_url,
            settings.timeout,
        )
        .map_err(|e| ExportError::Config(format!("cannot create Figma client: {e}")))?;
        let store = HttpImageStore::new(settings.timeout)
            .map_err(|e| ExportError::Config(format!("cannot create download client: {e}")))?;
        Ok(Self::new(api, store))
    }
}

impl<A, S> Exporter<A, S>
where
    A: DesignApi,
    S: ImageStore,
{
    pub fn new(api: A, store: S) -> Self {
        Self { api, store }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one export.
    ///
    /// `Err` means the run failed before any node was attempted. `Ok` carries
    /// one outcome per selected node, whatever happened to it.
    pub async fn run(
        &self,
        settings: &ExportSettings,
        cancel: &CancellationToken,
    ) -> Result<ExportReport> {
        let reference = extract_document_reference(&settings.url)?;
        let filter = settings.node_filter()?;
        let options = settings.render_options()?;
        tracing::info!(
            file_key = %reference.file_key,
            node_id = %reference.node_id,
            "starting export"
        );

        let candidates = {
            let tree = self
                .api
                .fetch_document_tree(&reference.file_key)
                .await
                .map_err(|e| ExportError::document_fetch(&reference.file_key, e))?;
            select_candidates(&tree, &reference.node_id, &filter)
        };
        if candidates.is_empty() {
            let types: Vec<&str> = filter.node_types().collect();
            return Err(ExportError::NoCandidates(format!(
                "no {} children under node {}",
                types.join("/"),
                reference.node_id
            )));
        }

        let target_dir = settings.image_save_path.as_path();
        self.store
            .ensure_directory(target_dir)
            .await
            .map_err(|source| ExportError::Directory {
                path: target_dir.to_path_buf(),
                source,
            })?;
        tracing::debug!(dir = %target_dir.display(), "target directory ready");

        let batch = request_renders(&self.api, &reference.file_key, &candidates, &options).await?;
        tracing::info!(
            requested = batch.len(),
            rendered = batch.rendered(),
            "render URLs received"
        );

        let outcomes = persist_all(
            &self.store,
            &batch.entries,
            target_dir,
            options.format,
            settings.concurrency,
            cancel,
        )
        .await;

        let report = ExportReport::new(reference, outcomes);
        let summary = report.summary();
        tracing::info!(
            state = ?report.state,
            succeeded = summary.succeeded,
            total = summary.total,
            "export finished"
        );
        Ok(report)
    }
}
