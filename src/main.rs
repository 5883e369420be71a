//! Site-Digest main entry point
//!
//! This is the command-line interface for the Site-Digest pipeline.

use anyhow::Context;
use clap::Parser;
use site_digest::config::{load_config_with_hash, Config};
use site_digest::crawler::{Coordinator, ProgressCallback};
use site_digest::output::print_statistics;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Site-Digest: discover a website's pages and extract their content
///
/// Site-Digest reads robots.txt and sitemaps (falling back to a shallow
/// link crawl), fetches every discovered page, renders client-side apps in
/// a headless browser when needed and emits a JSON report.
#[derive(Parser, Debug)]
#[command(name = "site-digest")]
#[command(version)]
#[command(about = "Website discovery and adaptive content extraction", long_about = None)]
struct Cli {
    /// Start URL of the site to digest
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Never launch a browser; client-rendered pages keep their HTTP result
    #[arg(long)]
    no_browser: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if cli.no_browser {
        config.browser.enabled = false;
    }

    let coordinator = Coordinator::new(config).context("Failed to initialize pipeline")?;

    let progress: Option<ProgressCallback> = if cli.quiet {
        None
    } else {
        Some(Arc::new(|done: usize, total: usize, url: &str| {
            tracing::info!("[{}/{}] {}", done, total, url);
        }))
    };

    let report = coordinator
        .run(&cli.url, progress)
        .await
        .with_context(|| format!("Pipeline failed for {}", cli.url))?;

    match &cli.output {
        Some(path) => report
            .save(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?,
        None => report
            .write_json(io::stdout().lock())
            .context("Failed to write report to stdout")?,
    }

    if !cli.quiet {
        print_statistics(&report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_digest=info,warn"),
            1 => EnvFilter::new("site_digest=debug,info"),
            2 => EnvFilter::new("site_digest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
