//! Crawl coordinator.
//!
//! Seeds the frontier, runs a fixed pool of workers, waits for the frontier
//! to drain, then stops the workers.
//!
//! # Concurrency Model
//!
//! - Each worker runs in its own Tokio task and pulls from the shared queue
//! - The pool size stays constant: work item failures never end a worker
//! - The run ends only by natural drain; each request has its own timeout
//!
//! # Example
//!
//! ```no_run
//! use dsstore_dump::{CrawlEngine, CrawlOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = CrawlEngine::new(CrawlOptions::default())?;
//! let stats = engine.run(&["example.com".to_string()]).await?;
//! println!("fetched {} files", stats.fetched());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use super::error::EngineError;
use super::frontier::Frontier;
use super::worker::{CrawlContext, run_worker};
use crate::download::{ClientOptions, DEFAULT_TIMEOUT, Fetcher, HttpClient, MAX_TIMEOUT};
use crate::dsstore::{DsStoreDecoder, MetadataDecoder};
use crate::parser::normalize_metadata_url;
use crate::user_agent::DEFAULT_USER_AGENT;

/// Minimum allowed worker count.
pub(crate) const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub(crate) const MAX_WORKERS: usize = 100;

/// Default worker count.
pub const DEFAULT_WORKERS: usize = 10;

/// Default mirror root.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Settings for one crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Number of concurrent workers (1-100).
    pub workers: usize,
    /// Mirror root.
    pub output_dir: PathBuf,
    /// Download again even if the local copy exists.
    pub overwrite: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            overwrite: false,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verify_tls: false,
        }
    }
}

impl CrawlOptions {
    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkerCount`] or
    /// [`EngineError::InvalidTimeout`].
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            return Err(EngineError::InvalidWorkerCount {
                value: self.workers,
            });
        }
        if self.timeout.is_zero() || self.timeout > MAX_TIMEOUT {
            return Err(EngineError::InvalidTimeout {
                timeout: self.timeout,
            });
        }
        Ok(())
    }

    /// Transport settings derived from these options.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
            verify_tls: self.verify_tls,
        }
    }
}

/// Statistics from one crawl.
///
/// Atomic counters updated by all workers.
#[derive(Debug, Default)]
pub struct CrawlStats {
    fetched: AtomicUsize,
    reused: AtomicUsize,
    failed: AtomicUsize,
    decoded: AtomicUsize,
    invalid_metadata: AtomicUsize,
    discovered: AtomicUsize,
    enqueued: AtomicUsize,
    completed: AtomicUsize,
}

impl CrawlStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files downloaded over the network.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }

    /// Existing local files used without a request.
    #[must_use]
    pub fn reused(&self) -> usize {
        self.reused.load(Ordering::SeqCst)
    }

    /// Work items that ended in an error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Metadata files decoded successfully.
    #[must_use]
    pub fn decoded(&self) -> usize {
        self.decoded.load(Ordering::SeqCst)
    }

    /// Metadata files rejected by the decoder (and removed).
    #[must_use]
    pub fn invalid_metadata(&self) -> usize {
        self.invalid_metadata.load(Ordering::SeqCst)
    }

    /// Entry URLs discovered inside metadata files.
    #[must_use]
    pub fn discovered(&self) -> usize {
        self.discovered.load(Ordering::SeqCst)
    }

    /// Work items enqueued, seeds included.
    #[must_use]
    pub fn enqueued(&self) -> usize {
        self.enqueued.load(Ordering::SeqCst)
    }

    /// Work items marked done.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn increment_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_reused(&self) {
        self.reused.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_decoded(&self) {
        self.decoded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_invalid_metadata(&self) {
        self.invalid_metadata.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Self {
        Self {
            fetched: AtomicUsize::new(self.fetched()),
            reused: AtomicUsize::new(self.reused()),
            failed: AtomicUsize::new(self.failed()),
            decoded: AtomicUsize::new(self.decoded()),
            invalid_metadata: AtomicUsize::new(self.invalid_metadata()),
            discovered: AtomicUsize::new(self.discovered()),
            enqueued: AtomicUsize::new(self.enqueued()),
            completed: AtomicUsize::new(self.completed()),
        }
    }
}

/// Recursive `.DS_Store` crawler.
pub struct CrawlEngine {
    options: CrawlOptions,
    fetcher: Fetcher,
    decoder: Arc<dyn MetadataDecoder>,
    discovery: Option<UnboundedSender<String>>,
}

impl std::fmt::Debug for CrawlEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlEngine")
            .field("options", &self.options)
            .field("discovery", &self.discovery.is_some())
            .finish_non_exhaustive()
    }
}

impl CrawlEngine {
    /// Creates an engine with the default `.DS_Store` decoder.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkerCount`] or
    /// [`EngineError::InvalidTimeout`] for out-of-range options, and
    /// [`EngineError::HttpClient`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip(options), fields(workers = options.workers))]
    pub fn new(options: CrawlOptions) -> Result<Self, EngineError> {
        options.validate()?;
        let client = HttpClient::new(&options.client_options()).map_err(EngineError::HttpClient)?;
        let fetcher = Fetcher::new(client, options.output_dir.clone(), options.overwrite);

        debug!(
            workers = options.workers,
            output_dir = %options.output_dir.display(),
            overwrite = options.overwrite,
            timeout_ms = options.timeout.as_millis(),
            verify_tls = options.verify_tls,
            "creating crawl engine"
        );

        Ok(Self {
            options,
            fetcher,
            decoder: Arc::new(DsStoreDecoder),
            discovery: None,
        })
    }

    /// Replaces the metadata decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn MetadataDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Sends every discovered entry URL, before classification, to `sink`.
    #[must_use]
    pub fn with_discovery_sink(mut self, sink: UnboundedSender<String>) -> Self {
        self.discovery = Some(sink);
        self
    }

    /// Returns the options the engine was built with.
    #[must_use]
    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawls from `seeds` until no work is left.
    ///
    /// Seeds are normalized to metadata URLs; duplicates are processed once.
    /// Individual URL failures are logged and counted, never returned.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutputDir`] if the output root cannot be created.
    #[instrument(skip(self, seeds), fields(seeds = seeds.len(), workers = self.options.workers))]
    pub async fn run(&self, seeds: &[String]) -> Result<CrawlStats, EngineError> {
        let output_dir = self.fetcher.output_dir();
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| EngineError::OutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let stats = Arc::new(CrawlStats::new());
        let frontier = Arc::new(Frontier::new());

        for seed in seeds {
            let url = normalize_metadata_url(seed);
            if frontier.claim_and_enqueue(url.as_str()) {
                stats.increment_enqueued();
            } else {
                debug!(url = %url, "duplicate seed");
            }
        }

        info!(seeds = frontier.outstanding(), "starting crawl");

        let ctx = Arc::new(CrawlContext {
            frontier: Arc::clone(&frontier),
            fetcher: self.fetcher.clone(),
            decoder: Arc::clone(&self.decoder),
            stats: Arc::clone(&stats),
            discovery: self.discovery.clone(),
        });

        let workers = self.options.workers;
        let handles: Vec<_> = (0..workers)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&ctx))))
            .collect();
        drop(ctx);

        frontier.wait_drained().await;
        debug!("frontier drained, stopping workers");
        frontier.shutdown(workers);

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task failed");
            }
        }

        info!(
            fetched = stats.fetched(),
            reused = stats.reused(),
            failed = stats.failed(),
            decoded = stats.decoded(),
            invalid_metadata = stats.invalid_metadata(),
            discovered = stats.discovered(),
            completed = stats.completed(),
            "crawl complete"
        );

        Ok(Arc::try_unwrap(stats).unwrap_or_else(|shared| shared.snapshot()))
    }
}
