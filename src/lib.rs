//! dsstore-dump core library
//!
//! Recursively discovers and mirrors files exposed through accidentally
//! published `.DS_Store` files on HTTP servers. A seed host is probed for its
//! `.DS_Store`, the entry names recorded in it are decoded, interesting files
//! are downloaded and anything that looks like a subdirectory is probed for
//! its own `.DS_Store`, until no work is left.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Seed parsing, metadata URL normalization, entry resolution
//! - [`classify`] - Decides what to do with each discovered entry name
//! - [`dsstore`] - Decoder for the `.DS_Store` buddy-allocator format
//! - [`download`] - HTTP client, local path mapping and the fetcher
//! - [`crawl`] - Shared frontier, workers and the coordinating engine

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod crawl;
pub mod download;
pub mod dsstore;
pub mod parser;
#[cfg(test)]
pub mod test_support;
pub mod user_agent;

// Re-export commonly used types
pub use classify::{EntryClass, classify_entry};
pub use crawl::{
    CrawlEngine, CrawlError, CrawlOptions, CrawlStats, DEFAULT_WORKERS, EngineError, Frontier,
    QueueMessage, WorkItem,
};
pub use download::{DownloadError, FetchOutcome, Fetcher, HttpClient, local_path_for};
pub use dsstore::{DsStore, DsStoreDecoder, FormatError, METADATA_FILENAME, MetadataDecoder};
pub use parser::{
    ParseError, SeedParseResult, is_metadata_url, normalize_metadata_url, parse_seeds,
    resolve_entry,
};
