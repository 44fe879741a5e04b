//! Opening the byte stream behind a data source location
//!
//! A location is either an `http(s)://` URL, a `file://` URL or a plain path.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

/// User agent sent with HTTP downloads
const USER_AGENT: &str = concat!("towndata/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when opening a data source
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or returned an error status
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Local file could not be opened
    #[error("Could not open {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Opens a readable line stream for a location
///
/// Implementations are called from a blocking worker thread.
pub trait SourceOpener: Send + Sync {
    fn open(&self, location: &str) -> Result<Box<dyn BufRead + Send>, FetchError>;
}

/// Opens URLs with a blocking HTTP client and everything else from disk
#[derive(Debug, Clone, Default)]
pub struct DefaultOpener;

impl DefaultOpener {
    pub fn new() -> Self {
        Self
    }

    fn open_url(&self, url: &str) -> Result<Box<dyn BufRead + Send>, FetchError> {
        let http_error = |source: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(http_error)?;
        let response = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?;

        Ok(Box::new(BufReader::new(response)))
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn BufRead + Send>, FetchError> {
        let file = File::open(path).map_err(|source| FetchError::File {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

impl SourceOpener for DefaultOpener {
    fn open(&self, location: &str) -> Result<Box<dyn BufRead + Send>, FetchError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            self.open_url(location)
        } else if let Some(path) = location.strip_prefix("file://") {
            self.open_file(Path::new(path))
        } else {
            self.open_file(Path::new(location))
        }
    }
}
