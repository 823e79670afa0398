//! Core data types shared by the export pipeline.

pub mod core;
pub mod outcome;

pub use self::core::{DocumentNode, DocumentReference, ExportCandidate};
pub use outcome::{ExportOutcome, ExportReport, OutcomeStatus, OutcomeSummary, RunState};
