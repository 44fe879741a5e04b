//! Town Data CLI - CT COVID-19 statistics per town
//!
//! Downloads the per-town data set (or reuses a fresh cached copy) and prints
//! every town above a confirmed cases limit.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use towndata::cache::CacheManager;
use towndata::cli::{Cli, StartupConfig};
use towndata::data::{DataSource, DefaultOpener, Retriever};
use towndata::report::{confirmed_cases_above, print_data};

/// Sets up logging on stderr so stdout only carries records
fn init_logging(verbose: u8) {
    // 0 = warn, 1 = info, 2+ = debug; RUST_LOG wins when set
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(config: StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cache = match config.cache_file {
        Some(path) => CacheManager::with_path(path),
        None => CacheManager::new().ok_or("Could not determine the home directory for the cache")?,
    };
    if config.refresh {
        cache.clear()?;
    }
    debug!(
        cache = %cache.path().display(),
        source = %config.retriever.source,
        data_set = DataSource::TestsCasesAndDeathsByTown.description(),
        "Starting retrieval"
    );

    let retriever = Retriever::new(
        Arc::new(cache),
        Arc::new(DefaultOpener::new()),
        config.retriever,
    );
    let data = retriever.get_data(None).await?;

    let mut stdout = io::stdout().lock();
    let printed = print_data(&mut stdout, &data, confirmed_cases_above(config.limit))?;
    debug!(printed, total = data.len(), "Done");

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
