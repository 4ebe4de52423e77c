//! buscrawl CLI
//!
//! Crawls a bus photo gallery starting from the given page, keeping only
//! photos of urban service lines, and downloads them with deterministic
//! sequence-numbered filenames.

use std::path::PathBuf;

use clap::Parser;

use buscrawl::{
    error::{AppError, Result},
    models::Config,
    pipeline,
};

/// buscrawl - Urban bus service photo crawler
#[derive(Parser, Debug)]
#[command(
    name = "buscrawl",
    version,
    about = "Crawls bus photo galleries and downloads urban service line photos"
)]
struct Cli {
    /// Gallery page to start crawling from
    start_url: String,

    /// Maximum number of gallery pages to process (default: all)
    #[arg(short, long)]
    pages: Option<usize>,

    /// Worker pool size, capped at 16; non-numeric values fall back to the
    /// configured default
    #[arg(short, long)]
    workers: Option<String>,

    /// Directory to download images into
    #[arg(short, long)]
    output: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long, default_value = "buscrawl.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.start_url.trim().is_empty() {
        log::error!("No start URL provided");
        return Err(AppError::config("start URL is required"));
    }

    let mut config = Config::load_or_default(&cli.config);
    if let Some(dir) = cli.output {
        config.output.download_dir = dir;
    }
    config.validate()?;

    // The prompt flow is lenient about the worker count: anything that does
    // not parse as a number falls back to the configured default.
    let workers = cli
        .workers
        .as_deref()
        .and_then(|w| w.trim().parse::<usize>().ok());

    let stats = pipeline::run_crawl(&config, &cli.start_url, cli.pages, workers).await?;

    log::info!(
        "Done: {} pages in {}s",
        stats.pages_processed,
        stats.elapsed().num_seconds()
    );

    Ok(())
}
