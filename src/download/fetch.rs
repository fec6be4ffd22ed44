//! Fetcher: maps a URL to its mirror path and downloads it unless a copy exists.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use url::Url;

use super::client::HttpClient;
use super::error::DownloadError;
use super::local_path::local_path_for;

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Local mirror path of the URL.
    pub path: PathBuf,
    /// False when an existing local copy was reused without a request.
    pub fetched: bool,
    /// Size of the local file.
    pub bytes: u64,
}

/// Downloads URLs into the mirror tree under one output directory.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: HttpClient,
    output_dir: PathBuf,
    overwrite: bool,
}

impl Fetcher {
    /// Creates a fetcher writing under `output_dir`.
    ///
    /// With `overwrite` false, a URL whose mirror path already exists is not
    /// requested again, which makes repeated runs incremental.
    #[must_use]
    pub fn new(client: HttpClient, output_dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            overwrite,
        }
    }

    /// Returns the mirror root.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetches `url` into its mirror path.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if the URL cannot be parsed or
    /// mapped, and whatever [`HttpClient::download_to_path`] returns.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let path = local_path_for(&self.output_dir, &parsed)?;

        if !self.overwrite
            && let Some(bytes) = existing_file_len(&path).await?
        {
            debug!(path = %path.display(), "local copy exists, skipping request");
            return Ok(FetchOutcome {
                path,
                fetched: false,
                bytes,
            });
        }

        let bytes = self.client.download_to_path(url, &path).await?;
        info!(path = %path.display(), bytes, "downloaded");
        Ok(FetchOutcome {
            path,
            fetched: true,
            bytes,
        })
    }
}

async fn existing_file_len(path: &Path) -> Result<Option<u64>, DownloadError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DownloadError::io(path, e)),
    }
}
