//! Per-candidate outcomes and the aggregate run report.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::core::DocumentReference;

/// Terminal status of one candidate's export attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeStatus {
    /// Image written to its final path
    Success,
    /// The render endpoint returned no URL for this node
    RenderFailed,
    /// Download or write failed; no file was left behind
    PersistFailed,
    /// Not attempted because the run was cancelled
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub node_id: String,
    pub name: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportOutcome {
    pub fn success(
        node_id: impl Into<String>,
        name: impl Into<String>,
        file_path: PathBuf,
        bytes: u64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            name: name.into(),
            status: OutcomeStatus::Success,
            file_path: Some(file_path),
            bytes: Some(bytes),
            error: None,
        }
    }

    pub fn render_failed(node_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::failure(
            node_id,
            name,
            OutcomeStatus::RenderFailed,
            "render endpoint returned no image URL",
        )
    }

    pub fn persist_failed(
        node_id: impl Into<String>,
        name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::failure(node_id, name, OutcomeStatus::PersistFailed, error)
    }

    pub fn skipped(node_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::failure(node_id, name, OutcomeStatus::Skipped, "export cancelled")
    }

    fn failure(
        node_id: impl Into<String>,
        name: impl Into<String>,
        status: OutcomeStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            name: name.into(),
            status,
            file_path: None,
            bytes: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Terminal state of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    /// Every candidate was exported
    CompletedAll,
    /// At least one candidate did not export (possibly all of them)
    CompletedPartial,
    /// A fatal error stopped the run before any per-node outcome
    Failed,
}

impl RunState {
    /// Derives the state from a non-empty outcome list.
    ///
    /// An empty list never comes out of a successful run, so it is reported
    /// as `Failed`.
    pub fn from_outcomes(outcomes: &[ExportOutcome]) -> Self {
        if outcomes.is_empty() {
            RunState::Failed
        } else if outcomes.iter().all(ExportOutcome::is_success) {
            RunState::CompletedAll
        } else {
            RunState::CompletedPartial
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeSummary {
    pub total: usize,
    pub succeeded: usize,
    pub render_failed: usize,
    pub persist_failed: usize,
    pub skipped: usize,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub reference: DocumentReference,
    pub state: RunState,
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportReport {
    pub fn new(reference: DocumentReference, outcomes: Vec<ExportOutcome>) -> Self {
        Self {
            reference,
            state: RunState::from_outcomes(&outcomes),
            outcomes,
        }
    }

    pub fn summary(&self) -> OutcomeSummary {
        self.outcomes
            .iter()
            .fold(OutcomeSummary::default(), |mut acc, outcome| {
                acc.total += 1;
                match outcome.status {
                    OutcomeStatus::Success => acc.succeeded += 1,
                    OutcomeStatus::RenderFailed => acc.render_failed += 1,
                    OutcomeStatus::PersistFailed => acc.persist_failed += 1,
                    OutcomeStatus::Skipped => acc.skipped += 1,
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> DocumentReference {
        DocumentReference {
            file_key: "KEY".into(),
            node_id: "1:1".into(),
        }
    }

    #[test]
    fn all_success_is_completed_all() {
        let report = ExportReport::new(
            reference(),
            vec![ExportOutcome::success("1:2", "A", PathBuf::from("a.png"), 10)],
        );
        assert_eq!(report.state, RunState::CompletedAll);
    }

    #[test]
    fn every_failure_is_still_partial_not_failed() {
        let report = ExportReport::new(
            reference(),
            vec![
                ExportOutcome::render_failed("1:2", "A"),
                ExportOutcome::persist_failed("1:3", "B", "disk full"),
            ],
        );
        assert_eq!(report.state, RunState::CompletedPartial);
        let summary = report.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.render_failed, 1);
        assert_eq!(summary.persist_failed, 1);
    }

    #[test]
    fn empty_outcomes_are_failed() {
        assert_eq!(RunState::from_outcomes(&[]), RunState::Failed);
    }

    #[test]
    fn outcome_serializes_camel_case_status() {
        let json = serde_json::to_string(&ExportOutcome::render_failed("1:2", "A"))
            .expect("serialize outcome");
        assert!(json.contains("\"status\":\"renderFailed\""));
        assert!(json.contains("\"nodeId\":\"1:2\""));
        assert!(!json.contains("filePath"));
    }
}
