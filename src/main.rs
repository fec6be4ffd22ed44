//! CLI entry point for dsstore-dump.

use std::fs;
use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result};
use clap::Parser;
use dsstore_dump::{CrawlEngine, parse_seeds};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use app_config::VerbositySetting;
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = app_config::load_default_file_config()?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => loaded
                .config
                .as_ref()
                .and_then(|cfg| cfg.verbosity)
                .map_or("info", VerbositySetting::filter_directive),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries discovered URLs only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    match (&loaded.path, loaded.config.is_some()) {
        (Some(path), true) => debug!(
            path = %path.display(),
            verbosity = loaded
                .config
                .as_ref()
                .and_then(|cfg| cfg.verbosity)
                .map_or("unset", VerbositySetting::as_str),
            "loaded config file"
        ),
        (Some(path), false) => debug!(path = %path.display(), "no config file"),
        (None, _) => debug!("no config directory"),
    }

    let Some(input_text) = read_seed_input(&args)? else {
        info!("No input provided. Pass seed URLs as arguments, with --input, or via stdin.");
        info!("Example: echo 'https://example.com/' | dsstore-dump");
        return Ok(());
    };

    let parsed = parse_seeds(&input_text);
    for skipped in &parsed.skipped {
        warn!(skipped = %skipped, "Skipped invalid seed");
    }
    if parsed.is_empty() {
        info!("No valid seeds found in input");
        return Ok(());
    }
    info!(
        seeds = parsed.len(),
        skipped = parsed.skipped_count(),
        "Parsed input"
    );

    let options = args.crawl_options(loaded.config.as_ref());
    let (sink, mut discovered) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(url) = discovered.recv().await {
            stdout.write_all(url.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<(), io::Error>(())
    });

    let engine = CrawlEngine::new(options)
        .context("Invalid crawl settings")?
        .with_discovery_sink(sink);
    let stats = engine.run(&parsed.seeds).await.context("Crawl failed")?;
    // closes the discovery channel so the printer can finish
    drop(engine);

    if let Err(e) = printer.await.context("URL printer task failed")? {
        // a closed pipe on stdout is not a crawl failure
        debug!(error = %e, "stopped printing discovered URLs");
    }

    info!(
        fetched = stats.fetched(),
        reused = stats.reused(),
        failed = stats.failed(),
        discovered = stats.discovered(),
        "Done"
    );

    Ok(())
}

/// Collects seed text from positional arguments, `--input` and, when neither
/// is given, a piped stdin. Returns `None` when there is nothing to read.
fn read_seed_input(args: &Args) -> Result<Option<String>> {
    let mut text = args.urls.join("\n");

    if let Some(path) = &args.input {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file '{}'", path.display()))?;
        text.push('\n');
        text.push_str(&content);
    }

    if args.urls.is_empty() && args.input.is_none() {
        if io::stdin().is_terminal() {
            return Ok(None);
        }
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read seeds from stdin")?;
    }

    Ok(Some(text))
}
