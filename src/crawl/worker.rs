//! Worker loop: fetch, decode, classify, re-enqueue.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{Instrument, debug, error, info_span, trace, warn};

use super::engine::CrawlStats;
use super::error::CrawlError;
use super::frontier::{Frontier, QueueMessage, WorkItem};
use crate::classify::{EntryClass, classify_entry};
use crate::download::{DownloadError, Fetcher};
use crate::dsstore::MetadataDecoder;
use crate::parser::{is_metadata_url, normalize_metadata_url, resolve_entry};

/// State shared by all workers of one run.
pub(crate) struct CrawlContext {
    pub(crate) frontier: Arc<Frontier>,
    pub(crate) fetcher: Fetcher,
    pub(crate) decoder: Arc<dyn MetadataDecoder>,
    pub(crate) stats: Arc<CrawlStats>,
    pub(crate) discovery: Option<UnboundedSender<String>>,
}

/// Runs until a shutdown message is received.
///
/// Every dequeued item is marked done exactly once, whatever happens while
/// processing it, including a panic.
pub(crate) async fn run_worker(id: usize, ctx: Arc<CrawlContext>) {
    debug!(worker = id, "worker started");
    loop {
        let item = match ctx.frontier.dequeue().await {
            QueueMessage::Work(item) => item,
            QueueMessage::Shutdown => break,
        };

        if ctx.frontier.begin(&item) {
            let span = info_span!("work_item", worker = id, url = item.url());
            let result = AssertUnwindSafe(ctx.process(&item).instrument(span))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(CrawlError::panicked(payload.as_ref())));
            if let Err(e) = result {
                ctx.report_failure(&item, &e);
            }
        } else {
            debug!(url = item.url(), "already processed, skipping");
        }

        ctx.frontier.mark_done();
        ctx.stats.increment_completed();
    }
    debug!(worker = id, "worker stopped");
}

impl CrawlContext {
    async fn process(&self, item: &WorkItem) -> Result<(), CrawlError> {
        let outcome = self.fetcher.fetch(item.url()).await?;
        if outcome.fetched {
            self.stats.increment_fetched();
        } else {
            self.stats.increment_reused();
        }

        if !is_metadata_url(item.url()) {
            return Ok(());
        }

        let bytes = tokio::fs::read(&outcome.path)
            .await
            .map_err(|e| CrawlError::read_metadata(&outcome.path, e))?;

        let names = match self.decoder.decode(&bytes) {
            Ok(names) => names,
            Err(source) => {
                self.stats.increment_invalid_metadata();
                if let Err(e) = tokio::fs::remove_file(&outcome.path).await {
                    warn!(path = %outcome.path.display(), error = %e, "failed to remove invalid metadata file");
                }
                return Err(CrawlError::invalid_metadata(&outcome.path, source));
            }
        };
        self.stats.increment_decoded();
        debug!(entries = names.len(), "decoded metadata file");

        for name in &names {
            self.expand(item.url(), name);
        }
        Ok(())
    }

    /// Resolves, reports, classifies and possibly enqueues one entry.
    fn expand(&self, base: &str, name: &str) {
        let resolved = match resolve_entry(base, name) {
            Ok(url) => url,
            Err(e) => {
                debug!(name, error = %e, "skipping entry");
                return;
            }
        };

        self.stats.increment_discovered();
        if let Some(sink) = &self.discovery {
            // receiver gone means nobody is listening any more
            let _ = sink.send(resolved.clone());
        }

        let target = match classify_entry(name) {
            EntryClass::DirectFetch => resolved,
            EntryClass::ProbeAsDirectory => normalize_metadata_url(&resolved),
            EntryClass::Ignore => {
                trace!(name, "ignoring entry");
                return;
            }
        };

        if self.frontier.claim_and_enqueue(target.as_str()) {
            self.stats.increment_enqueued();
            debug!(url = %target, "enqueued");
        } else {
            trace!(url = %target, "already claimed");
        }
    }

    fn report_failure(&self, item: &WorkItem, error: &CrawlError) {
        self.stats.increment_failed();
        match error {
            CrawlError::Download(DownloadError::HttpStatus { status, .. }) => {
                warn!(url = item.url(), status, "HTTP error");
            }
            CrawlError::Download(e) if e.is_remote() => {
                warn!(url = item.url(), kind = e.kind(), error = %e, "fetch failed");
            }
            CrawlError::InvalidMetadata { path, source } => {
                warn!(url = item.url(), path = %path.display(), error = %source, "invalid metadata file removed");
            }
            other => {
                error!(url = item.url(), kind = other.kind(), error = %other, "unexpected error");
            }
        }
    }
}
