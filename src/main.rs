use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cid_harvester::prelude::*;

#[derive(Parser)]
#[command(name = "cid_harvester")]
#[command(about = "Collects CIDs of sensitive-looking files from ipfs-search", long_about = None)]
struct Cli {
    /// Output root holding the registry and the per-day run folders
    #[arg(default_value = "./data")]
    output_dir: PathBuf,

    /// TOML file overriding the built-in search configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Highest page index to request per pattern
    #[arg(long)]
    page_limit: Option<u32>,

    /// Extra attempts for a page whose fetch failed
    #[arg(long)]
    max_retries: Option<u32>,

    /// Base URL of the search API
    #[arg(long)]
    api_base: Option<String>,

    /// Run in batch mode (no progress bar)
    #[arg(long)]
    batch: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn search_config(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => SearchConfig::default(),
        };

        if let Some(page_limit) = self.page_limit {
            config.page_limit = page_limit;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(api_base) = &self.api_base {
            config.api_base = api_base.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.search_config()?;

    // Set up graceful shutdown handler
    let shutdown_requested = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown_requested.clone();

    ctrlc::set_handler(move || {
        eprintln!("\nShutdown requested. Saving what was collected so far...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    info!(
        patterns = config.patterns.len(),
        page_limit = config.page_limit,
        output = %cli.output_dir.display(),
        "starting collection"
    );

    let progress = if cli.batch {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(config.patterns.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        pb
    };

    // File names follow the hour the run started in
    let started_at = chrono::Local::now().naive_local();

    let mut source = HttpPageSource::new(&config)?;
    let summary = Collector::new(&mut source, &config)
        .with_shutdown_flag(shutdown_requested)
        .with_progress(progress.clone())
        .run(&cli.output_dir, started_at)?;

    progress.finish_and_clear();

    write_summary(&mut std::io::stdout().lock(), &summary)?;

    Ok(())
}
