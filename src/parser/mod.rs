//! Seed parsing and URL handling.
//!
//! Turns raw seed input (command-line arguments, files, stdin) into canonical
//! metadata URLs, and resolves entry names discovered inside a metadata file
//! relative to the file they were found in.
//!
//! # Example
//!
//! ```
//! use dsstore_dump::parser::parse_seeds;
//!
//! let result = parse_seeds("example.com\n# comment\nhttps://example.org/files/\n");
//! assert_eq!(
//!     result.seeds,
//!     vec![
//!         "http://example.com/.DS_Store".to_string(),
//!         "https://example.org/files/.DS_Store".to_string(),
//!     ]
//! );
//! ```

mod error;
mod url;

pub use error::{MAX_URL_LENGTH, ParseError};
pub use url::{is_metadata_url, normalize_metadata_url, resolve_entry};

use std::collections::HashSet;

use tracing::{debug, info};

/// Result of parsing seed input.
#[derive(Debug, Clone, Default)]
pub struct SeedParseResult {
    /// Canonical metadata URLs, in first-seen order, without duplicates.
    pub seeds: Vec<String>,
    /// Lines that could not be turned into a seed.
    pub skipped: Vec<ParseError>,
}

impl SeedParseResult {
    /// Returns the number of usable seeds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Returns true if no usable seed was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Returns the number of rejected lines.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Parses seed addresses, one per line.
///
/// Blank lines and lines starting with `#` are ignored. Every other line is
/// normalized to its metadata URL and validated; invalid lines are collected
/// in [`SeedParseResult::skipped`] instead of failing the whole parse.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn parse_seeds(input: &str) -> SeedParseResult {
    let mut result = SeedParseResult::default();
    let mut seen: HashSet<String> = HashSet::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let normalized = normalize_metadata_url(line);
        match url::validate_url(&normalized) {
            Ok(parsed) => {
                let canonical = parsed.to_string();
                if seen.insert(canonical.clone()) {
                    debug!(seed = %canonical, "accepted seed");
                    result.seeds.push(canonical);
                }
            }
            Err(e) => {
                debug!(line, error = %e, "rejected seed");
                result.skipped.push(e);
            }
        }
    }

    info!(
        seeds = result.len(),
        skipped = result.skipped_count(),
        "parsed seed input"
    );
    result
}
