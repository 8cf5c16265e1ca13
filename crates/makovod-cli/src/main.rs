use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use makovod_core::{CacheStore, MakoScraper, NameRefreshOptions};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod ui;

use ui::{MenuChooser, print_outcome, print_report};

#[derive(Parser)]
#[command(name = "mako-vod", version, about = "Find a playable stream URL on mako.co.il VOD")]
struct Cli {
    /// Skip fetching show names and use cached names only
    #[arg(long)]
    skip_name_fetch: bool,

    /// Maximum number of show names to fetch this run
    #[arg(long, value_name = "N")]
    max_shows: Option<usize>,

    /// Only update the show name cache, don't resolve a video
    #[arg(long)]
    update_mode: bool,

    /// Show name cache file (default: next to the executable)
    #[arg(long, value_name = "PATH")]
    cache_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let scraper = MakoScraper::new().context("Failed to create HTTP client")?;
    let store = CacheStore::new(cli.cache_file.unwrap_or_else(CacheStore::default_path));
    info!(path = %store.path().display(), "show name cache");
    let options = NameRefreshOptions {
        skip_name_fetch: cli.skip_name_fetch,
        max_shows: cli.max_shows,
        ..NameRefreshOptions::default()
    };

    let interrupted = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let (shows, report) = scraper.shows_with_names(&store, &options, interrupted).await;
    print_report(&report);

    if report.interrupted {
        return Ok(());
    }

    if cli.update_mode {
        println!("Shows cache update complete ({} shows).", shows.len());
        return Ok(());
    }

    let watcher = spawn_cancel_watcher();
    let outcome = scraper.navigate(&shows, &mut MenuChooser).await;
    watcher.abort();
    print_outcome(&outcome);

    Ok(())
}

/// Exits on Ctrl-C while navigation is fetching
///
/// Runs as its own task so it fires even while a menu blocks the main task.
fn spawn_cancel_watcher() -> JoinHandle<()> {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nOperation cancelled");
            std::process::exit(130);
        }
    })
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
