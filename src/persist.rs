//! Writes rendered images to disk, one independent outcome per node.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

use crate::format::ImageFormat;
use crate::render::RenderEntry;
use crate::storage::ImageStore;
use crate::types::ExportOutcome;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Builds `{name}__{node id with '-'}__{timestamp_ms}.{ext}`.
///
/// Path separators and control characters in the name become `_`.
pub fn export_file_name(
    name: &str,
    node_id: &str,
    timestamp_ms: u128,
    format: ImageFormat,
) -> String {
    let safe_name: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!(
        "{safe_name}__{}__{timestamp_ms}.{}",
        node_id.replace(':', "-"),
        format.as_str()
    )
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Persists a single render result.
///
/// Never fails: a missing URL or a download/write error becomes the outcome.
pub async fn persist_image<S>(
    store: &S,
    entry: &RenderEntry,
    target_dir: &Path,
    format: ImageFormat,
) -> ExportOutcome
where
    S: ImageStore + ?Sized,
{
    let candidate = &entry.candidate;
    let Some(url) = entry.url.as_deref() else {
        tracing::warn!(node_id = %candidate.id, name = %candidate.name, "node failed to render");
        return ExportOutcome::render_failed(&candidate.id, &candidate.name);
    };

    let file_name = export_file_name(&candidate.name, &candidate.id, timestamp_ms(), format);
    let path: PathBuf = target_dir.join(&file_name);

    match store.stream_to_file(url, &path).await {
        Ok(bytes) => {
            tracing::info!(node_id = %candidate.id, file = %file_name, bytes, "saved image");
            ExportOutcome::success(&candidate.id, &candidate.name, path, bytes)
        }
        Err(e) => {
            tracing::warn!(node_id = %candidate.id, error = %e, "failed to save image");
            ExportOutcome::persist_failed(&candidate.id, &candidate.name, e.to_string())
        }
    }
}

/// Persists every entry with at most `concurrency` downloads in flight.
///
/// Outcomes come back in entry order. Entries not yet started when `cancel`
/// fires are reported as skipped; downloads already running finish normally.
pub async fn persist_all<S>(
    store: &S,
    entries: &[RenderEntry],
    target_dir: &Path,
    format: ImageFormat,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Vec<ExportOutcome>
where
    S: ImageStore + ?Sized,
{
    stream::iter(entries)
        .map(|entry| async move {
            if cancel.is_cancelled() {
                return ExportOutcome::skipped(&entry.candidate.id, &entry.candidate.name);
            }
            persist_image(store, entry, target_dir, format).await
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PersistError;
    use crate::types::{ExportCandidate, OutcomeStatus};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes the URL text as file content; URLs containing "fail" error out.
    #[derive(Default)]
    struct FakeStore {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        written: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl ImageStore for FakeStore {
        async fn ensure_directory(&self, path: &Path) -> std::io::Result<()> {
            std::fs::create_dir_all(path)
        }

        async fn stream_to_file(&self, url: &str, path: &Path) -> Result<u64, PersistError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("fail") {
                return Err(PersistError::Status { status: 500 });
            }
            std::fs::write(path, url.as_bytes()).map_err(|source| PersistError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(url.len() as u64)
        }
    }

    fn entry(id: &str, name: &str, url: Option<&str>) -> RenderEntry {
        RenderEntry {
            candidate: ExportCandidate {
                id: id.into(),
                name: name.into(),
            },
            url: url.map(str::to_string),
        }
    }

    fn files_in(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn file_name_follows_pattern() {
        assert_eq!(
            export_file_name("A", "1:2", 1700000000123, ImageFormat::Png),
            "A__1-2__1700000000123.png"
        );
        assert_eq!(
            export_file_name("Icons/Arrow", "10:20", 5, ImageFormat::Svg),
            "Icons_Arrow__10-20__5.svg"
        );
    }

    #[test]
    fn same_name_different_ids_differ() {
        let a = export_file_name("Card", "1:2", 42, ImageFormat::Jpg);
        let b = export_file_name("Card", "1:3", 42, ImageFormat::Jpg);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn null_url_does_not_block_sibling() {
        let dir = TempDir::new().expect("tempdir");
        let store = FakeStore::default();
        let entries = vec![
            entry("1:2", "A", None),
            entry("1:3", "B", Some("http://img/b.png")),
        ];

        let outcomes = persist_all(
            &store,
            &entries,
            dir.path(),
            ImageFormat::Png,
            DEFAULT_CONCURRENCY,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, OutcomeStatus::RenderFailed);
        assert!(outcomes[0].file_path.is_none());
        assert_eq!(outcomes[1].status, OutcomeStatus::Success);
        let files = files_in(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("B__1-3__") && files[0].ends_with(".png"));
    }

    #[tokio::test]
    async fn persist_failure_is_recorded_and_others_continue() {
        let dir = TempDir::new().expect("tempdir");
        let store = FakeStore::default();
        let entries = vec![
            entry("1:2", "A", Some("http://img/fail.png")),
            entry("1:3", "B", Some("http://img/b.png")),
        ];

        let outcomes = persist_all(
            &store,
            &entries,
            dir.path(),
            ImageFormat::Png,
            1,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcomes[0].status, OutcomeStatus::PersistFailed);
        assert!(outcomes[0]
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("500"));
        assert_eq!(outcomes[1].status, OutcomeStatus::Success);
        assert_eq!(files_in(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn duplicate_names_produce_distinct_files() {
        let dir = TempDir::new().expect("tempdir");
        let store = FakeStore::default();
        let entries = vec![
            entry("1:2", "Card", Some("http://img/1.png")),
            entry("1:3", "Card", Some("http://img/2.png")),
        ];

        let outcomes = persist_all(
            &store,
            &entries,
            dir.path(),
            ImageFormat::Png,
            2,
            &CancellationToken::new(),
        )
        .await;

        let paths: HashSet<_> = outcomes.iter().filter_map(|o| o.file_path.clone()).collect();
        assert_eq!(paths.len(), 2);
        assert_eq!(files_in(dir.path()).len(), 2);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let dir = TempDir::new().expect("tempdir");
        let store = FakeStore::default();
        let entries: Vec<RenderEntry> = (0..12)
            .map(|i| {
                entry(
                    &format!("1:{i}"),
                    &format!("F{i}"),
                    Some("http://img/x.png"),
                )
            })
            .collect();

        let outcomes = persist_all(
            &store,
            &entries,
            dir.path(),
            ImageFormat::Png,
            3,
            &CancellationToken::new(),
        )
        .await;

        assert!(outcomes.iter().all(ExportOutcome::is_success));
        assert!(store.max_in_flight.load(Ordering::SeqCst) <= 3);
        let order: Vec<&str> = outcomes.iter().map(|o| o.node_id.as_str()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("1:{i}")).collect();
        assert_eq!(order, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn cancelled_run_skips_remaining_entries() {
        let dir = TempDir::new().expect("tempdir");
        let store = FakeStore::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let entries = vec![
            entry("1:2", "A", Some("http://img/a.png")),
            entry("1:3", "B", None),
        ];

        let outcomes =
            persist_all(&store, &entries, dir.path(), ImageFormat::Png, 2, &cancel).await;

        assert!(outcomes
            .iter()
            .all(|o| o.status == OutcomeStatus::Skipped));
        assert!(files_in(dir.path()).is_empty());
        assert!(store.written.lock().unwrap().is_empty());
    }
}
