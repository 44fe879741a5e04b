//! Retrieval of town data with a disk cache in front of the download
//!
//! A retrieval checks the cache first; on a miss it opens the source, parses
//! every line, saves the result to the cache and returns it. The whole cycle
//! runs as one blocking task so the caller's runtime threads never block on I/O.

use std::io::BufRead;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{CsvParser, DataSource, FetchError, ParseError, ParsedLine, SourceOpener, TownData};
use crate::cache::{CacheManager, TOO_OLD_DAYS};

/// Errors that can occur when retrieving town data
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The source could not be opened
    #[error("There was a problem opening the data: {0}")]
    Fetch(#[from] FetchError),

    /// Reading from the source failed part way through
    #[error("There was a problem reading the data: {0}")]
    Read(#[from] std::io::Error),

    /// A line held a value that could not be parsed or validated
    #[error("Could not parse line {line_number}: {line}")]
    Parse {
        line_number: usize,
        line: String,
        #[source]
        source: ParseError,
    },

    /// The retrieval task panicked or was cancelled
    #[error("There was a problem processing the data: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration for a [`Retriever`]
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Location used when a call does not name one
    pub source: String,
    /// Cached data at least this many days old is fetched again
    pub max_age_days: u32,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            source: DataSource::TestsCasesAndDeathsByTown
                .csv_download_url()
                .to_string(),
            max_age_days: TOO_OLD_DAYS,
        }
    }
}

/// Fetches town data, serving it from the cache while it is fresh
#[derive(Clone)]
pub struct Retriever {
    cache: Arc<CacheManager>,
    opener: Arc<dyn SourceOpener>,
    config: RetrieverConfig,
}

impl Retriever {
    /// Creates a new Retriever
    ///
    /// # Arguments
    /// * `cache` - Cache shared with every other retriever in the process
    /// * `opener` - Opens the byte stream for a source location
    /// * `config` - Default source and freshness window
    pub fn new(
        cache: Arc<CacheManager>,
        opener: Arc<dyn SourceOpener>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            cache,
            opener,
            config,
        }
    }

    /// Returns the cache this retriever reads and writes
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Gets the town data, from the cache if fresh, otherwise from the source
    ///
    /// # Arguments
    /// * `source_override` - URL or path to read instead of the configured source
    ///
    /// # Returns
    /// * `Ok(Vec<TownData>)` - Every valid row, in source order
    /// * `Err(RetrieveError)` - If the source cannot be read or a line holds an
    ///   unparsable value; no partial data is returned
    pub async fn get_data(
        &self,
        source_override: Option<&str>,
    ) -> Result<Vec<TownData>, RetrieveError> {
        let location = source_override
            .unwrap_or(self.config.source.as_str())
            .to_string();
        let cache = Arc::clone(&self.cache);
        let opener = Arc::clone(&self.opener);
        let max_age_days = self.config.max_age_days;

        tokio::task::spawn_blocking(move || {
            retrieve(&cache, opener.as_ref(), &location, max_age_days)
        })
        .await?
    }
}

/// Runs one full retrieval cycle on the current thread
fn retrieve(
    cache: &CacheManager,
    opener: &dyn SourceOpener,
    location: &str,
    max_age_days: u32,
) -> Result<Vec<TownData>, RetrieveError> {
    let mut data = Vec::new();
    cache.load_from_cache(&mut data, max_age_days);
    if !data.is_empty() {
        info!(path = %cache.path().display(), records = data.len(), "Found fresh data in local cache");
        return Ok(data);
    }

    info!(source = location, "Getting data");
    let reader = opener.open(location)?;
    let data = parse_all(reader)?;

    cache.save_cache(&data);
    Ok(data)
}

/// Parses every line of a source, skipping the header and malformed lines
fn parse_all(reader: impl BufRead) -> Result<Vec<TownData>, RetrieveError> {
    let mut parser = CsvParser::new();
    let mut data = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        match parser.parse_line(&line) {
            Ok(ParsedLine::Record(record)) => data.push(record),
            Ok(ParsedLine::Header) => debug!(line_number, "Skipping header"),
            Ok(ParsedLine::Malformed { columns }) => {
                warn!(line_number, columns, line = %line, "Skipping invalid line");
            }
            Err(source) => {
                return Err(RetrieveError::Parse {
                    line_number,
                    line,
                    source,
                })
            }
        }
    }

    Ok(data)
}
