//! HTTP client wrapper for streaming files to disk.
//!
//! This module provides the `HttpClient` struct which holds one configured
//! `reqwest::Client` for a whole run and streams response bodies to their
//! mirror paths.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::constants::DEFAULT_TIMEOUT;
use super::error::DownloadError;
use crate::user_agent::DEFAULT_USER_AGENT;

/// Transport settings shared by every request of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Per-request timeout, applied to connect and to the whole request.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Verify TLS certificates. Off by default.
    pub verify_tls: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verify_tls: false,
        }
    }
}

/// HTTP client for downloading files with streaming support.
///
/// Create it once and share it between workers; cloning is cheap and reuses
/// the connection pool.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use dsstore_dump::download::{ClientOptions, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(&ClientOptions::default())?;
/// let bytes = client
///     .download_to_path("http://example.com/.DS_Store", Path::new("out/.DS_Store"))
///     .await?;
/// println!("wrote {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a client from the given options.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    #[instrument(level = "debug", skip(options), fields(timeout = ?options.timeout, verify_tls = options.verify_tls))]
    pub fn new(options: &ClientOptions) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(options.timeout)
            .timeout(options.timeout)
            .gzip(true)
            .user_agent(options.user_agent.as_str())
            .danger_accept_invalid_certs(!options.verify_tls)
            .build()?;
        Ok(Self { client })
    }

    /// Downloads `url` to `path`, creating parent directories.
    ///
    /// Returns the number of bytes written. A partially written file is
    /// removed when the body stream fails, so it cannot be mistaken for a
    /// complete copy later.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::HttpStatus`] for a non-success response
    /// - [`DownloadError::Timeout`] / [`DownloadError::Network`] for transport failures
    /// - [`DownloadError::Io`] if the file cannot be created or written
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn download_to_path(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        debug!("starting download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let mut file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        let stream_result = stream_to_file(&mut file, response, url, path).await;
        if stream_result.is_err() {
            debug!(path = %path.display(), "cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(path).await;
        }
        stream_result
    }
}

/// Streams response body to file, returning bytes written.
///
/// Split out so the caller can clean up on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::transport(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn test_client() -> HttpClient {
        HttpClient::new(&ClientOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn test_http_client_download_success() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/notes.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"secret notes"))
            .mount(&mock_server)
            .await;

        let target = temp_dir.path().join("host/notes.txt");
        let url = format!("{}/notes.txt", mock_server.uri());
        let bytes = test_client().download_to_path(&url, &target).await.unwrap();

        assert_eq!(bytes, 12);
        assert_eq!(std::fs::read(&target).unwrap(), b"secret notes");
    }

    #[tokio::test]
    async fn test_http_client_creates_parent_directories() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/a/b/.DS_Store"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x"))
            .mount(&mock_server)
            .await;

        let target = temp_dir.path().join("h/a/b/.DS_Store");
        let url = format!("{}/a/b/.DS_Store", mock_server.uri());
        test_client().download_to_path(&url, &target).await.unwrap();

        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_http_client_download_404_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/missing.zip"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let target = temp_dir.path().join("missing.zip");
        let url = format!("{}/missing.zip", mock_server.uri());
        let result = test_client().download_to_path(&url, &target).await;

        match result {
            Err(DownloadError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!target.exists(), "no file should be created for an error status");
    }

    #[tokio::test]
    async fn test_http_client_download_500_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let url = format!("{}/error", mock_server.uri());
        let result = test_client()
            .download_to_path(&url, &temp_dir.path().join("error"))
            .await;

        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_http_client_download_timeout_leaves_no_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new(&ClientOptions {
            timeout: Duration::from_secs(1),
            ..ClientOptions::default()
        })
        .unwrap();
        let target = temp_dir.path().join("slow");
        let url = format!("{}/slow", mock_server.uri());
        let result = client.download_to_path(&url, &target).await;

        assert!(
            matches!(result, Err(DownloadError::Timeout { .. })),
            "expected timeout, got {result:?}"
        );
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_http_client_connection_refused_is_network_error() {
        let temp_dir = TempDir::new().unwrap();
        // port 9 (discard) on localhost is closed in test environments
        let result = test_client()
            .download_to_path("http://127.0.0.1:9/.DS_Store", &temp_dir.path().join("x"))
            .await;

        assert!(
            matches!(
                result,
                Err(DownloadError::Network { .. } | DownloadError::Timeout { .. })
            ),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_http_client_sends_configured_user_agent() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/ua"))
            .and(header("user-agent", "custom-agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new(&ClientOptions {
            user_agent: "custom-agent/1.0".to_string(),
            ..ClientOptions::default()
        })
        .unwrap();
        let url = format!("{}/ua", mock_server.uri());
        let result = client
            .download_to_path(&url, &temp_dir.path().join("ua"))
            .await;

        assert!(result.is_ok(), "got {result:?}");
    }

    #[tokio::test]
    async fn test_http_client_default_user_agent() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/default-ua"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/default-ua", mock_server.uri());
        let result = test_client()
            .download_to_path(&url, &temp_dir.path().join("default-ua"))
            .await;

        assert!(result.is_ok(), "got {result:?}");
    }

    #[tokio::test]
    async fn test_http_client_large_file_streams() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let large_content = vec![7u8; 1024 * 1024];

        Mock::given(method("GET"))
            .and(path("/dump.sql"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(large_content))
            .mount(&mock_server)
            .await;

        let target = temp_dir.path().join("dump.sql");
        let url = format!("{}/dump.sql", mock_server.uri());
        let bytes = test_client().download_to_path(&url, &target).await.unwrap();

        assert_eq!(bytes, 1024 * 1024);
        assert_eq!(std::fs::metadata(&target).unwrap().len(), 1024 * 1024);
    }
}
