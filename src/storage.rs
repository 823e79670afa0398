//! Directory preparation and streaming image downloads to disk.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Suffix of the temporary file a download is streamed into before rename.
pub const PARTIAL_SUFFIX: &str = ".part";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("download failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image host returned status {status}")]
    Status { status: u16 },
    #[error("write to {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Storage capabilities the persister needs.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Creates `path` and its parents if missing.
    async fn ensure_directory(&self, path: &Path) -> std::io::Result<()>;

    /// Streams the image at `url` into `path`, returning the byte count.
    ///
    /// On error no file is left at `path`.
    async fn stream_to_file(&self, url: &str, path: &Path) -> Result<u64, PersistError>;
}

/// Downloads over HTTP and writes with a temp-file-then-rename step.
#[derive(Debug, Clone)]
pub struct HttpImageStore {
    http: Client,
}

impl HttpImageStore {
    pub fn new(timeout: Duration) -> Result<Self, PersistError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    async fn download_into(&self, url: &str, partial: &Path) -> Result<u64, PersistError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PersistError::Status {
                status: status.as_u16(),
            });
        }

        let write_err = |source| PersistError::Write {
            path: partial.to_path_buf(),
            source,
        };

        let mut file = fs::File::create(partial).await.map_err(write_err)?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        Ok(written)
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn ensure_directory(&self, path: &Path) -> std::io::Result<()> {
        fs::create_dir_all(path).await
    }

    async fn stream_to_file(&self, url: &str, path: &Path) -> Result<u64, PersistError> {
        let partial = partial_path(path);
        let result = match self.download_into(url, &partial).await {
            Ok(written) => fs::rename(&partial, path)
                .await
                .map(|_| written)
                .map_err(|source| PersistError::Write {
                    path: path.to_path_buf(),
                    source,
                }),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = fs::remove_file(&partial).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %partial.display(), error = %e, "failed to remove partial file");
                }
            }
        }
        result
    }
}

/// `<path>.part`, next to the final file so the rename stays on one filesystem.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store() -> HttpImageStore {
        HttpImageStore::new(Duration::from_secs(5)).expect("store")
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/tmp/out/A__1-2__1.png")),
            PathBuf::from("/tmp/out/A__1-2__1.png.part")
        );
    }

    #[tokio::test]
    async fn ensure_directory_creates_nested_dirs() {
        let dir = TempDir::new().expect("tempdir");
        let nested = dir.path().join("figma").join("images");

        store().ensure_directory(&nested).await.expect("create");
        store().ensure_directory(&nested).await.expect("idempotent");
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn stream_to_file_writes_all_bytes() {
        let server = MockServer::start().await;
        let body = vec![7u8; 64 * 1024];
        Mock::given(method("GET"))
            .and(url_path("/img/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("a.png");
        let written = store()
            .stream_to_file(&format!("{}/img/a.png", server.uri()), &target)
            .await
            .expect("stream");

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&target).expect("read"), body);
        assert!(!partial_path(&target).exists());
    }

    #[tokio::test]
    async fn http_error_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/img/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("gone.png");
        let result = store()
            .stream_to_file(&format!("{}/img/gone.png", server.uri()), &target)
            .await;

        assert!(matches!(result, Err(PersistError::Status { status: 404 })));
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
    }

    #[tokio::test]
    async fn unwritable_target_is_write_error_without_leftovers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("missing-dir").join("a.png");
        let result = store()
            .stream_to_file(&format!("{}/img/a.png", server.uri()), &target)
            .await;

        assert!(matches!(result, Err(PersistError::Write { .. })));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn truncated_body_removes_partial_file() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 100000\r\n\r\n";
            socket.write_all(head.as_bytes()).await.expect("write head");
            socket.write_all(&[9u8; 5000]).await.expect("write body");
            socket.flush().await.expect("flush");
        });

        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("cut.png");
        let result = store()
            .stream_to_file(&format!("http://{addr}/img/cut.png"), &target)
            .await;
        server.await.expect("server task");

        assert!(matches!(result, Err(PersistError::Request(_))), "got {result:?}");
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("a.png");
        let result = store()
            .stream_to_file("http://127.0.0.1:1/a.png", &target)
            .await;

        assert!(matches!(result, Err(PersistError::Request(_))));
        assert!(!target.exists());
    }
}
