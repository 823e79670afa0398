use crate::figma::FigmaError;
use crate::reference::ReferenceError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: any of these stops the run before a file is written.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ReferenceError),

    #[error("Failed to fetch document {file_key}: {source}")]
    DocumentFetch {
        file_key: String,
        #[source]
        source: FigmaError,
    },

    #[error("Nothing to export: {0}")]
    NoCandidates(String),

    #[error("Render request failed: {message}")]
    RenderRequest {
        message: String,
        #[source]
        source: Option<FigmaError>,
    },

    #[error("Cannot prepare directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExportError {
    pub fn document_fetch(file_key: impl Into<String>, source: FigmaError) -> Self {
        ExportError::DocumentFetch {
            file_key: file_key.into(),
            source,
        }
    }

    pub fn render_request(message: impl Into<String>) -> Self {
        ExportError::RenderRequest {
            message: message.into(),
            source: None,
        }
    }

    pub fn render_request_from(source: FigmaError) -> Self {
        ExportError::RenderRequest {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            ExportError::InvalidUrl(e) => {
                let remediation = match e {
                    ReferenceError::MissingNodeId { .. } => {
                        "Include the page node-id in the URL (e.g., ?node-id=1-2)."
                    }
                    ReferenceError::MissingFileKey { .. } => {
                        "Use a Figma URL with a file key: https://www.figma.com/file/<FILE_KEY>/..."
                    }
                    ReferenceError::Malformed { .. } => {
                        "Verify the URL format (e.g., https://www.figma.com/file/<FILE_KEY>/...)."
                    }
                };
                ErrorPayload::new(ErrorCategory::Config, self.to_string(), remediation)
            }
            ExportError::DocumentFetch { source, .. } => ErrorPayload::new(
                figma_category(source),
                self.to_string(),
                figma_remediation(source),
            ),
            ExportError::NoCandidates(_) => ErrorPayload::new(
                ErrorCategory::Config,
                self.to_string(),
                "Check that node-id points at a page and that --node-types / --ignore-node-name match its children.",
            ),
            ExportError::RenderRequest { source, .. } => match source {
                Some(source) => ErrorPayload::new(
                    figma_category(source),
                    self.to_string(),
                    figma_remediation(source),
                ),
                None => ErrorPayload::new(
                    ErrorCategory::Figma,
                    self.to_string(),
                    "Retry the export; reduce --scale if large frames time out.",
                ),
            },
            ExportError::Directory { .. } => ErrorPayload::new(
                ErrorCategory::Storage,
                self.to_string(),
                "Check --image-save-path and its permissions.",
            ),
            ExportError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("token") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        self.to_string(),
                        "Pass --access-token or set FIGMA_TOKEN (or FIGMA_OAUTH_TOKEN).",
                    )
                } else if lower.contains("scale") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        self.to_string(),
                        "Use a --scale between 0.01 and 4.",
                    )
                } else if lower.contains("config") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        self.to_string(),
                        "Fix or remove the config file (~/.config/fex/config.toml or --config).",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        self.to_string(),
                        "Check flags and paths; run with --verbose for details.",
                    )
                }
            }
        }
    }
}

fn figma_category(err: &FigmaError) -> ErrorCategory {
    match err {
        FigmaError::Request(_) => ErrorCategory::Network,
        _ => ErrorCategory::Figma,
    }
}

fn figma_remediation(err: &FigmaError) -> &'static str {
    match err {
        FigmaError::Request(_) => "Check connectivity/proxy/VPN and retry.",
        FigmaError::RateLimited(_) => "Wait for the rate limit window to pass and retry.",
        FigmaError::Api { status, .. } if *status == 403 || *status == 401 => {
            "Check the access token and that it can read this file."
        }
        FigmaError::Api { status, .. } if *status == 404 => "Check the file key in the URL.",
        _ => "Check FIGMA_TOKEN/URL and rate limits; retry after waiting.",
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Network,
    Figma,
    Storage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
