//! mediascan CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use mediascan::{
    config,
    error::{AppError, Result},
    models::{Config, ScrapeStatus},
    pipeline,
    storage::{ArticleStore, LocalStorage, MemoryStorage, ScrapeLogSink},
};

/// mediascan - news site article collector
#[derive(Parser, Debug)]
#[command(
    name = "mediascan",
    version,
    about = "Collects recent articles from news sites via REST API, feeds, or HTML heuristics"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Storage directory (overrides `paths.storage_dir`)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape recent articles from one or more sites
    Scrape {
        /// Site URL to scrape (repeatable); defaults to the sites file
        #[arg(long = "url")]
        urls: Vec<String>,

        /// File listing one site URL per line
        #[arg(long)]
        sites_file: Option<PathBuf>,

        /// Only keep articles from the last N days
        #[arg(long)]
        days: Option<u32>,

        /// Scrape without writing anything to storage
        #[arg(long)]
        dry_run: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration and the sites file
    Validate {
        #[arg(long)]
        sites_file: Option<PathBuf>,
    },

    /// Show stored article count and recorded scrape outcomes
    Stats {
        /// Month to report, as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
}

/// Initialize logging; `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let invalid = || AppError::validation(format!("invalid month '{raw}', expected YYYY-MM"));
    let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

fn site_list(urls: Vec<String>, sites_file: Option<PathBuf>, config: &Config) -> Result<Vec<String>> {
    if !urls.is_empty() {
        return Ok(urls);
    }
    let path = sites_file.unwrap_or_else(|| PathBuf::from(&config.paths.sites_file));
    config::load_sites(&path)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let config = config::load_config(&cli.config)?;
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    init_logging(level);

    if config_found {
        log::info!("Loaded configuration from {}", cli.config.display());
    } else {
        log::warn!("{} not found, using default configuration", cli.config.display());
    }

    let storage_dir = cli
        .storage_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.paths.storage_dir));

    match cli.command {
        Command::Scrape {
            urls,
            sites_file,
            days,
            dry_run,
            json,
        } => {
            let sites = site_list(urls, sites_file, &config)?;
            let days = days.unwrap_or(config.scrape.days_window);

            let (store, log_sink): (Arc<dyn ArticleStore>, Arc<dyn ScrapeLogSink>) = if dry_run {
                log::info!("Dry run: nothing will be written");
                let memory = Arc::new(MemoryStorage::new());
                (memory.clone(), memory)
            } else {
                let local = Arc::new(LocalStorage::new(&storage_dir));
                (local.clone(), local)
            };

            let summary = pipeline::run_scrape(&config, &sites, days, store, log_sink).await?;
            summary.log();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            if summary.total_sites > 0 && summary.failed == summary.total_sites {
                return Err(AppError::validation("every site failed"));
            }
        }

        Command::Validate { sites_file } => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("✓ Config OK");

            let path = sites_file.unwrap_or_else(|| PathBuf::from(&config.paths.sites_file));
            let sites = config::load_sites(&path)?;
            let invalid = config::invalid_sites(&sites);
            for (url, e) in &invalid {
                log::error!("Invalid site {}: {}", url, e);
            }
            if !invalid.is_empty() {
                return Err(AppError::validation(format!(
                    "{} of {} sites are invalid",
                    invalid.len(),
                    sites.len()
                )));
            }
            log::info!("✓ {} sites OK in {}", sites.len(), path.display());
        }

        Command::Stats { month } => {
            let (year, month) = match month {
                Some(raw) => parse_month(&raw)?,
                None => {
                    let now = Utc::now();
                    (now.year(), now.month())
                }
            };
            print_stats(&storage_dir, year, month).await?;
        }
    }

    Ok(())
}

async fn print_stats(storage_dir: &Path, year: i32, month: u32) -> Result<()> {
    let storage = LocalStorage::new(storage_dir);
    log::info!("Storage directory: {}", storage.root_dir().display());
    log::info!("Stored articles: {}", storage.article_count().await?);

    let outcomes = storage.load_outcomes(year, month).await?;
    if outcomes.is_empty() {
        log::info!("No scrape runs recorded for {}-{:02}", year, month);
        return Ok(());
    }

    let count = |status: ScrapeStatus| outcomes.iter().filter(|o| o.status == status).count();
    log::info!(
        "{} runs in {}-{:02}: {} success, {} partial, {} error",
        outcomes.len(),
        year,
        month,
        count(ScrapeStatus::Success),
        count(ScrapeStatus::Partial),
        count(ScrapeStatus::Error)
    );
    for outcome in outcomes.iter().rev().take(20) {
        log::info!(
            "  {} {} [{}] {}",
            outcome.recorded_at.format("%Y-%m-%d %H:%M"),
            outcome.site_id,
            outcome.status,
            outcome.message
        );
    }
    Ok(())
}
