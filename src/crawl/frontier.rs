//! Shared crawl frontier: the dedup set and the work queue.
//!
//! # Drain accounting
//!
//! `outstanding` counts items that were enqueued and not yet marked done. It
//! is incremented before an item becomes visible to workers and decremented
//! only after the item (including any work it enqueued) has been processed.
//! New work is always enqueued by a worker that is still inside an unfinished
//! item, so the counter cannot reach zero while more work can appear.

use dashmap::DashSet;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{trace, warn};

/// A URL to process. Everything else is derived while processing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    url: String,
}

impl WorkItem {
    /// Wraps a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Returns the URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// What a worker receives from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueMessage {
    /// Process this item.
    Work(WorkItem),
    /// Stop the worker. Sent once per worker after the queue has drained.
    Shutdown,
}

/// Dedup set plus unbounded FIFO work queue with drain detection.
#[derive(Debug)]
pub struct Frontier {
    claimed: DashSet<String>,
    started: DashSet<String>,
    sender: mpsc::UnboundedSender<QueueMessage>,
    receiver: Mutex<mpsc::UnboundedReceiver<QueueMessage>>,
    outstanding: watch::Sender<usize>,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    /// Creates an empty frontier.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (outstanding, _) = watch::channel(0);
        Self {
            claimed: DashSet::new(),
            started: DashSet::new(),
            sender,
            receiver: Mutex::new(receiver),
            outstanding,
        }
    }

    /// Atomically reserves `url`. Returns true only for the first caller.
    pub fn try_claim(&self, url: &str) -> bool {
        self.claimed.insert(url.to_string())
    }

    /// Returns true if `url` has been claimed.
    #[must_use]
    pub fn is_claimed(&self, url: &str) -> bool {
        self.claimed.contains(url)
    }

    /// Number of URLs claimed so far.
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }

    /// Adds an item to the queue and counts it as outstanding.
    pub fn enqueue(&self, item: WorkItem) {
        self.outstanding.send_modify(|n| *n += 1);
        trace!(url = item.url(), "enqueue");
        if self.sender.send(QueueMessage::Work(item)).is_err() {
            // unreachable while `self` owns the receiver
            warn!("work queue closed, dropping item");
            self.mark_done();
        }
    }

    /// Claims `url` and enqueues it if the claim succeeded.
    pub fn claim_and_enqueue(&self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.try_claim(&url) {
            self.enqueue(WorkItem::new(url));
            true
        } else {
            false
        }
    }

    /// Records that processing of `item` starts. Returns false if the same
    /// URL was already started, in which case the item must only be marked
    /// done.
    pub fn begin(&self, item: &WorkItem) -> bool {
        self.started.insert(item.url.clone())
    }

    /// Waits for the next message.
    pub async fn dequeue(&self) -> QueueMessage {
        let mut receiver = self.receiver.lock().await;
        // `self` holds a sender, so the channel never reports closed
        receiver.recv().await.unwrap_or(QueueMessage::Shutdown)
    }

    /// Marks one dequeued item as finished, whatever its outcome.
    pub fn mark_done(&self) {
        self.outstanding.send_modify(|n| {
            if *n == 0 {
                warn!("mark_done called with no outstanding work");
            }
            *n = n.saturating_sub(1);
        });
    }

    /// Number of enqueued items not yet marked done.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Resolves once every enqueued item has been marked done.
    pub async fn wait_drained(&self) {
        let mut receiver = self.outstanding.subscribe();
        // `self` keeps the sender alive, so this only returns at zero
        let _ = receiver.wait_for(|n| *n == 0).await;
    }

    /// Sends one shutdown message per worker.
    pub fn shutdown(&self, workers: usize) {
        for _ in 0..workers {
            if self.sender.send(QueueMessage::Shutdown).is_err() {
                warn!("work queue closed before shutdown");
                return;
            }
        }
    }
}
