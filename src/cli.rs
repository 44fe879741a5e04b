//! Command-line interface parsing for the town data CLI
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the settings used to build the cache and the retriever.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::cache::TOO_OLD_DAYS;
use crate::data::RetrieverConfig;
use crate::report::DEFAULT_CONFIRMED_CASES_LIMIT;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The confirmed cases limit is negative
    #[error("Limit cannot be a negative number: {0}")]
    NegativeLimit(i64),
}

/// Download CT COVID-19 data per town and show the towns above a confirmed cases limit
#[derive(Parser, Debug)]
#[command(name = "towndata")]
#[command(about = "Connecticut COVID-19 statistics per town")]
#[command(version)]
pub struct Cli {
    /// Only show towns with more confirmed cases than this
    #[arg(short, long, value_name = "CASES", allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Read the CSV from this URL or path instead of the CT Data portal
    #[arg(long, value_name = "URL|PATH")]
    pub source: Option<String>,

    /// Re-download when the cached copy is at least this many days old
    #[arg(long, value_name = "DAYS", default_value_t = TOO_OLD_DAYS)]
    pub max_age_days: u32,

    /// Cache file location (defaults to ~/Downloads/covid19_ct.json)
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Discard the cached copy before retrieving
    #[arg(long)]
    pub refresh: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Towns with more confirmed cases than this are printed
    pub limit: u64,
    /// Retriever settings
    pub retriever: RetrieverConfig,
    /// Cache file override
    pub cache_file: Option<PathBuf>,
    /// Whether to drop the cache before retrieving
    pub refresh: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CONFIRMED_CASES_LIMIT,
            retriever: RetrieverConfig::default(),
            cache_file: None,
            refresh: false,
        }
    }
}

/// Parses the limit argument, rejecting negative values
pub fn parse_limit_arg(limit: i64) -> Result<u64, CliError> {
    u64::try_from(limit).map_err(|_| CliError::NegativeLimit(limit))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the limit is negative
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let defaults = StartupConfig::default();
        let limit = match cli.limit {
            Some(limit) => parse_limit_arg(limit)?,
            None => defaults.limit,
        };

        Ok(StartupConfig {
            limit,
            retriever: RetrieverConfig {
                source: cli.source.clone().unwrap_or(defaults.retriever.source),
                max_age_days: cli.max_age_days,
            },
            cache_file: cli.cache_file.clone(),
            refresh: cli.refresh,
        })
    }
}
