//! Oscar-Crawl main entry point
//!
//! This is the command-line interface for the Oscar-Crawl job service.

use anyhow::Context;
use clap::Parser;
use oscar_crawl::api::create_router;
use oscar_crawl::config::{load_config_with_hash, Config};
use oscar_crawl::output::print_job_summary;
use oscar_crawl::{CrawlMode, JobManager, JobStatus};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Oscar-Crawl: award-film extraction behind an asynchronous job API
///
/// By default the HTTP API is served on the configured bind address. With
/// `--once`, a single crawl job runs in the foreground and its summary is
/// printed.
#[derive(Parser, Debug)]
#[command(name = "oscar-crawl")]
#[command(version = "1.0.0")]
#[command(about = "Award-film crawler with an asynchronous job API", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run one crawl job and exit instead of serving the API
    #[arg(long)]
    once: bool,

    /// Crawl mode for --once (browser or network)
    #[arg(long, requires = "once")]
    mode: Option<CrawlMode>,

    /// Years to crawl with --once; discovered when omitted
    #[arg(long, num_args = 1.., requires = "once")]
    years: Vec<i32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let manager = JobManager::from_config(&config, Some(config_hash))
        .context("failed to initialize crawler")?;

    if cli.once {
        handle_once(&manager, cli.mode, cli.years).await
    } else {
        handle_serve(&config, manager).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("oscar_crawl=info,warn"),
            1 => EnvFilter::new("oscar_crawl=debug,tower_http=debug,info"),
            2 => EnvFilter::new("oscar_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Serves the job API until the process is stopped
async fn handle_serve(config: &Config, manager: JobManager) -> anyhow::Result<()> {
    let addr = &config.server.bind_address;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        "Serving on {} (default mode: {}, data dir: {})",
        addr,
        manager.default_mode(),
        config.output.data_dir
    );

    axum::serve(listener, create_router(manager))
        .await
        .context("server error")?;

    Ok(())
}

/// Runs one job to completion and prints its summary
async fn handle_once(
    manager: &JobManager,
    mode: Option<CrawlMode>,
    years: Vec<i32>,
) -> anyhow::Result<()> {
    if let Some(bad) = years.iter().find(|year| **year <= 0) {
        anyhow::bail!("years must be positive integers, got {}", bad);
    }

    let mode = mode.unwrap_or_else(|| manager.default_mode());
    let years = if years.is_empty() { None } else { Some(years) };

    let job = manager.submit(mode, years);
    let job = manager
        .wait_for_terminal(&job.job_id)
        .await
        .with_context(|| format!("job {} disappeared", job.job_id))?;

    print_job_summary(&job);

    if job.status == JobStatus::Failed {
        anyhow::bail!(
            "crawl failed: {}",
            job.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}
