//! Figma API client for fetching file trees and requesting renders.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::api_types::{FigmaErrorBody, FigmaFile, FigmaImageExport};
use super::{DesignApi, RenderUrls};
use crate::render::RenderOptions;
use crate::types::DocumentNode;

pub const DEFAULT_BASE_URL: &str = "https://api.figma.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum FigmaError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Figma API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Missing access token")]
    MissingToken,
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

#[derive(Debug, Clone)]
pub enum FigmaAuth {
    PersonalAccessToken(String),
    OAuthToken(String),
}

impl FigmaAuth {
    pub fn from_env() -> Option<Self> {
        if let Ok(token) = std::env::var("FIGMA_TOKEN") {
            if !token.is_empty() {
                return Some(Self::PersonalAccessToken(token));
            }
        }

        if let Ok(token) = std::env::var("FIGMA_OAUTH_TOKEN") {
            if !token.is_empty() {
                return Some(Self::OAuthToken(token));
            }
        }

        None
    }

    fn token(&self) -> &str {
        match self {
            FigmaAuth::PersonalAccessToken(token) | FigmaAuth::OAuthToken(token) => token,
        }
    }

    fn headers(&self) -> Result<HeaderMap, FigmaError> {
        let mut headers = HeaderMap::new();
        match self {
            FigmaAuth::PersonalAccessToken(token) => {
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-figma-token"),
                    HeaderValue::from_str(token).map_err(|_| FigmaError::MissingToken)?,
                );
            }
            FigmaAuth::OAuthToken(token) => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {token}"))
                        .map_err(|_| FigmaError::MissingToken)?,
                );
            }
        }
        Ok(headers)
    }
}

#[derive(Debug, Clone)]
pub struct FigmaClient {
    http: Client,
    base_url: Url,
}

impl FigmaClient {
    pub fn new(auth: FigmaAuth) -> Result<Self, FigmaError> {
        Self::with_base_url_and_timeout(auth, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url_and_timeout(
        auth: FigmaAuth,
        base_url: impl AsRef<str>,
        timeout: Duration,
    ) -> Result<Self, FigmaError> {
        if auth.token().trim().is_empty() {
            return Err(FigmaError::MissingToken);
        }

        let mut base_url = Url::parse(base_url.as_ref())?;
        // Endpoints are joined relative to the base, so keep any path prefix.
        if !base_url.path().ends_with('/') {
            let prefixed = format!("{}/", base_url.path());
            base_url.set_path(&prefixed);
        }
        let http = Client::builder()
            .default_headers(auth.headers()?)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub async fn get_file(&self, file_key: &str) -> Result<FigmaFile, FigmaError> {
        let url = self.endpoint(&format!("v1/files/{file_key}"))?;
        tracing::debug!(%url, "fetching document tree");
        self.send_json(self.http.get(url)).await
    }

    /// Requests render URLs for every id in one call.
    pub async fn get_images(
        &self,
        file_key: &str,
        node_ids: &[String],
        options: &RenderOptions,
    ) -> Result<FigmaImageExport, FigmaError> {
        let mut url = self.endpoint(&format!("v1/images/{file_key}"))?;
        url.query_pairs_mut()
            .append_pair("ids", &node_ids.join(","))
            .append_pair("scale", &options.scale.to_string())
            .append_pair("format", options.format.as_str());
        tracing::debug!(%url, nodes = node_ids.len(), "requesting renders");
        self.send_json(self.http.get(url)).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, FigmaError> {
        Ok(self.base_url.join(path)?)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FigmaError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(FigmaError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(FigmaError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<FigmaErrorBody>(body)
        .ok()
        .and_then(FigmaErrorBody::into_message)
        .unwrap_or_else(|| format!("Figma API returned status {}", status.as_u16()))
}

#[async_trait]
impl DesignApi for FigmaClient {
    async fn fetch_document_tree(&self, file_key: &str) -> Result<DocumentNode, FigmaError> {
        let file = self.get_file(file_key).await?;
        tracing::debug!(
            name = file.name.as_deref().unwrap_or("<unnamed>"),
            version = file.version.as_deref().unwrap_or("-"),
            "fetched document"
        );
        Ok(file.document)
    }

    async fn fetch_render_urls(
        &self,
        file_key: &str,
        node_ids: &[String],
        options: &RenderOptions,
    ) -> Result<RenderUrls, FigmaError> {
        let export = self.get_images(file_key, node_ids, options).await?;
        if let Some(err) = export.err.filter(|e| !e.is_empty()) {
            return Err(FigmaError::Render(err));
        }
        Ok(export.images)
    }
}
