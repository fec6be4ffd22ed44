//! Error types for the crawl engine.

use std::any::Any;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::engine::{MAX_WORKERS, MIN_WORKERS};
use crate::download::{DownloadError, MAX_TIMEOUT};
use crate::dsstore::FormatError;

/// Failure while processing a single work item.
///
/// Never escapes a worker: it is logged and counted, and the worker moves on.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Fetching the URL failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A file fetched as metadata could not be decoded. The local copy has
    /// been removed.
    #[error("invalid metadata file {path}: {source}")]
    InvalidMetadata {
        /// Local path of the rejected file.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: FormatError,
    },

    /// A fetched metadata file could not be read back from disk.
    #[error("failed to read {path}: {source}")]
    ReadMetadata {
        /// Local path of the file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Processing the item panicked.
    #[error("work item panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl CrawlError {
    /// Creates an invalid-metadata error.
    pub fn invalid_metadata(path: impl Into<PathBuf>, source: FormatError) -> Self {
        Self::InvalidMetadata {
            path: path.into(),
            source,
        }
    }

    /// Creates a read error for a fetched metadata file.
    pub fn read_metadata(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadMetadata {
            path: path.into(),
            source,
        }
    }

    /// Creates an error from a caught panic payload.
    #[must_use]
    pub fn panicked(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked { message }
    }

    /// Stable label for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Download(e) => e.kind(),
            Self::InvalidMetadata { .. } => "invalid_metadata",
            Self::ReadMetadata { .. } => "io",
            Self::Panicked { .. } => "panic",
        }
    }
}

/// Errors that prevent a crawl from starting.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Worker count outside the accepted range.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The rejected value.
        value: usize,
    },

    /// Timeout of zero or above the accepted maximum.
    #[error("invalid timeout {timeout:?}: must be greater than zero and at most {MAX_TIMEOUT:?}")]
    InvalidTimeout {
        /// The rejected value.
        timeout: Duration,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The output root could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// The output root.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
