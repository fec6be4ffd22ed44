//! Concurrent discovery-and-fetch engine.
//!
//! - [`Frontier`]: dedup set and work queue with drain detection
//! - workers: fetch a URL, decode it if it is a metadata file, enqueue what
//!   it lists
//! - [`CrawlEngine`]: seeds the frontier, runs the worker pool, stops it
//!   once the frontier drains

mod engine;
mod error;
mod frontier;
mod worker;

pub use engine::{CrawlEngine, CrawlOptions, CrawlStats, DEFAULT_OUTPUT_DIR, DEFAULT_WORKERS};
pub use error::{CrawlError, EngineError};
pub use frontier::{Frontier, QueueMessage, WorkItem};
