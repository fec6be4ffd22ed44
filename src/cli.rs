//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use dsstore_dump::CrawlOptions;

use crate::app_config::FileConfig;

/// Largest accepted `--timeout` value in seconds.
const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Recursively mirror files listed in exposed `.DS_Store` files.
///
/// Each seed (a host, a directory URL or a `.DS_Store` URL) is probed for
/// its `.DS_Store`. Every entry name it lists is printed to stdout as a full
/// URL; interesting files are downloaded and subdirectories are probed in
/// turn until nothing is left.
#[derive(Parser, Debug)]
#[command(name = "dsstore-dump")]
#[command(author, version, about)]
pub struct Args {
    /// Seed addresses (read from stdin when neither URLS nor --input is given)
    #[arg(value_name = "URLS")]
    pub urls: Vec<String>,

    /// Read seed addresses from a file, one per line
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Number of concurrent workers (1-100) [default: 10]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: Option<u8>,

    /// Mirror root directory [default: output]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Download files again even when a local copy exists
    #[arg(short = 'f', long)]
    pub overwrite: bool,

    /// Per-request timeout in seconds [default: 15]
    #[arg(short, long, value_name = "SECS", value_parser = parse_timeout_secs)]
    pub timeout: Option<f64>,

    /// User-Agent header sent with every request
    #[arg(short = 'A', long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Verify TLS certificates (invalid certificates are accepted by default)
    #[arg(long)]
    pub verify_tls: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Merges command-line values over `file` values over built-in defaults.
    #[must_use]
    pub fn crawl_options(&self, file: Option<&FileConfig>) -> CrawlOptions {
        let defaults = CrawlOptions::default();
        let file = file.cloned().unwrap_or_default();

        let timeout = self
            .timeout
            .or(file.timeout_secs)
            .map_or(defaults.timeout, Duration::from_secs_f64);

        CrawlOptions {
            workers: self
                .workers
                .map(usize::from)
                .or(file.workers)
                .unwrap_or(defaults.workers),
            output_dir: self
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or(defaults.output_dir),
            overwrite: self.overwrite || file.overwrite.unwrap_or(defaults.overwrite),
            timeout,
            user_agent: self
                .user_agent
                .clone()
                .or(file.user_agent)
                .unwrap_or(defaults.user_agent),
            verify_tls: self.verify_tls || file.verify_tls.unwrap_or(defaults.verify_tls),
        }
    }
}

fn parse_timeout_secs(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_finite() && value > 0.0 && value <= MAX_TIMEOUT_SECS {
        Ok(value)
    } else {
        Err(format!("must be greater than 0 and at most {MAX_TIMEOUT_SECS}"))
    }
}
