//! Figma Exporter (FEX) Library
//!
//! Exports rendered images of the frames on a Figma page to a local
//! directory. The pipeline runs in five steps:
//!
//! 1. [`reference`] - parse the file key and page id out of a Figma URL
//! 2. [`selector`] - pick the page children to export
//! 3. [`render`] - request render URLs for all of them in one call
//! 4. [`persist`] - stream each image to disk, one outcome per node
//! 5. [`export`] - sequence the above and produce an [`ExportReport`]
//!
//! Remote access goes through the [`DesignApi`] and [`ImageStore`] traits so
//! the pipeline can run against fakes.
//!
//! # Example
//!
//! ```no_run
//! use fex_lib::{ExportSettings, Exporter, FigmaAuth};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> fex_lib::Result<()> {
//! let settings = ExportSettings::new(
//!     "https://www.figma.com/file/KEY/Title?node-id=1-1",
//!     FigmaAuth::PersonalAccessToken("token".into()),
//! );
//! let exporter = Exporter::from_settings(&settings)?;
//! let report = exporter.run(&settings, &CancellationToken::new()).await?;
//! println!("{:?}: {} files", report.state, report.summary().succeeded);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod figma;
pub mod format;
pub mod output;
pub mod persist;
pub mod reference;
pub mod render;
pub mod selector;
pub mod storage;
pub mod types;

pub use config::{Config, ConfigError, ExportSettings};
pub use error::{ErrorCategory, ErrorPayload, ExportError, Result};
pub use export::Exporter;
pub use figma::{DesignApi, FigmaAuth, FigmaClient, FigmaError, RenderUrls};
pub use format::ImageFormat;
pub use output::{ErrorOutput, ExportOutput, FexOutput, FEX_OUTPUT_VERSION};
pub use persist::{export_file_name, persist_all, persist_image};
pub use reference::{extract_document_reference, ReferenceError};
pub use render::{request_renders, RenderBatch, RenderEntry, RenderOptions};
pub use selector::{select_candidates, NodeFilter};
pub use storage::{HttpImageStore, ImageStore, PersistError};
pub use types::{
    DocumentNode, DocumentReference, ExportCandidate, ExportOutcome, ExportReport, OutcomeStatus,
    OutcomeSummary, RunState,
};
