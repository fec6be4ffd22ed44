//! Fetching remote files into the local mirror tree.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large archives)
//! - One per-request timeout, configurable User-Agent and TLS verification
//! - Deterministic URL to local path mapping that stays under the output root
//! - Skips the request when a local copy exists, unless overwriting
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use dsstore_dump::download::{ClientOptions, Fetcher, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&ClientOptions::default())?;
//! let fetcher = Fetcher::new(client, "output", false);
//! let outcome = fetcher.fetch("http://example.com/.DS_Store").await?;
//! println!("{} (fetched: {})", outcome.path.display(), outcome.fetched);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod fetch;
mod local_path;

pub use client::{ClientOptions, HttpClient};
pub use constants::{DEFAULT_TIMEOUT, MAX_TIMEOUT};
pub use error::DownloadError;
pub use fetch::{FetchOutcome, Fetcher};
pub use local_path::local_path_for;
