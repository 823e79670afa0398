use crate::error::ErrorPayload;
use crate::types::{DocumentReference, ExportOutcome, ExportReport, OutcomeSummary, RunState};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version for output payloads.
pub const FEX_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum FexOutput {
    Export(ExportOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutput {
    pub version: String,
    pub document: DocumentReference,
    pub image_save_path: PathBuf,
    pub state: RunState,
    pub summary: OutcomeSummary,
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportOutput {
    pub fn from_report(report: ExportReport, image_save_path: PathBuf) -> Self {
        Self {
            version: FEX_OUTPUT_VERSION.to_string(),
            summary: report.summary(),
            document: report.reference,
            image_save_path,
            state: report.state,
            outcomes: report.outcomes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    pub state: RunState,
    pub error: ErrorPayload,
}

impl ErrorOutput {
    pub fn new(error: ErrorPayload) -> Self {
        Self {
            version: FEX_OUTPUT_VERSION.to_string(),
            state: RunState::Failed,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn export_output_serializes() {
        let report = ExportReport::new(
            DocumentReference {
                file_key: "KEY".into(),
                node_id: "1:1".into(),
            },
            vec![
                ExportOutcome::success("1:2", "A", PathBuf::from("out/A__1-2__1.png"), 128),
                ExportOutcome::render_failed("1:3", "B"),
            ],
        );
        let output = FexOutput::Export(ExportOutput::from_report(report, PathBuf::from("out")));

        let json = serde_json::to_string(&output).expect("serialize export output");
        assert!(json.contains("\"mode\":\"export\""));
        assert!(json.contains("\"state\":\"completedPartial\""));
        assert!(json.contains("\"fileKey\":\"KEY\""));
        assert!(json.contains("\"succeeded\":1"));
    }

    #[test]
    fn error_output_serializes_as_failed() {
        let output = FexOutput::Error(ErrorOutput::new(ErrorPayload::new(
            ErrorCategory::Config,
            "Invalid URL".to_string(),
            "Fix it",
        )));

        let json = serde_json::to_string(&output).expect("serialize error output");
        assert!(json.contains("\"mode\":\"error\""));
        assert!(json.contains("\"state\":\"failed\""));
        assert!(json.contains("\"category\":\"config\""));
    }
}
