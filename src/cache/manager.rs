//! Cache manager for persisting town data to disk
//!
//! Provides a `CacheManager` that keeps the most recently fetched collection in
//! memory behind a read/write lock and mirrors it to a single JSON file.

use chrono::{DateTime, Duration, Utc};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, error, info, warn};

use crate::data::TownData;

/// Name of the cache file inside the user's `Downloads` directory
pub const CACHE_FILE_NAME: &str = "covid19_ct.json";

/// Cached data older than this many days is not reused
pub const TOO_OLD_DAYS: u32 = 1;

/// Snapshot of a fetched collection, as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached records, in source order
    pub records: Vec<TownData>,
    /// When the records were fetched
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(records: Vec<TownData>) -> Self {
        Self {
            records,
            fetched_at: Utc::now(),
        }
    }

    /// Whether the entry is at least `days` days old
    ///
    /// An entry stamped in the future (clock skew, edited file) is too old.
    pub fn is_too_old(&self, days: u32) -> bool {
        let age = Utc::now() - self.fetched_at;
        age < Duration::zero() || age >= Duration::days(i64::from(days))
    }
}

/// Reasons a cache file could not be used
#[derive(Debug)]
enum LoadFailure {
    Io(io::Error),
    Corrupt(serde_json::Error),
}

/// Manages the in-memory snapshot and the cache file
///
/// One instance is meant to be shared (behind an `Arc`) by every retriever in
/// the process. The lock guards the in-memory snapshot and serializes writers
/// of the file; the file itself is replaced by rename so other processes never
/// read a half-written file.
#[derive(Debug)]
pub struct CacheManager {
    /// Location of the cache file
    path: PathBuf,
    /// Last entry saved or loaded by this process
    state: RwLock<Option<CacheEntry>>,
}

impl CacheManager {
    /// Creates a new CacheManager using `~/Downloads/covid19_ct.json`
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let user_dirs = UserDirs::new()?;
        let path = user_dirs.home_dir().join("Downloads").join(CACHE_FILE_NAME);
        Some(Self::with_path(path))
    }

    /// Creates a new CacheManager with a custom cache file
    ///
    /// Useful for testing or when a specific cache location is needed.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(None),
        }
    }

    /// Returns the path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the in-memory snapshot is at least `days` days old
    ///
    /// An empty cache counts as too old.
    pub fn is_too_old(&self, days: u32) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.as_ref().map_or(true, |entry| entry.is_too_old(days))
    }

    /// Loads fresh records from the cache file into `out`
    ///
    /// `out` is replaced with the cached records when the file exists, parses,
    /// and is younger than `max_age_days`. In every other case `out` is left
    /// empty and the miss is logged.
    pub fn load_from_cache(&self, out: &mut Vec<TownData>, max_age_days: u32) {
        out.clear();

        if !self.path.exists() {
            debug!(path = %self.path.display(), "No cache file");
            return;
        }

        let entry = match self.read_entry() {
            Ok(entry) => entry,
            Err(LoadFailure::Io(e)) => {
                warn!(path = %self.path.display(), error = %e, "Could not read cache file");
                return;
            }
            Err(LoadFailure::Corrupt(e)) => {
                error!(path = %self.path.display(), error = %e, "Cannot re-use cache file, ignoring it");
                return;
            }
        };

        if entry.is_too_old(max_age_days) {
            warn!(
                path = %self.path.display(),
                fetched_at = %entry.fetched_at,
                "Data from cache is too old"
            );
            return;
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        out.extend(entry.records.iter().cloned());
        *state = Some(entry);
    }

    /// Saves records to the in-memory snapshot and the cache file
    ///
    /// Does nothing when `records` is empty, so an empty download never
    /// replaces good data. Failures are logged and otherwise ignored.
    pub fn save_cache(&self, records: &[TownData]) {
        if records.is_empty() {
            debug!("Not caching an empty collection");
            return;
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let entry = CacheEntry::new(records.to_vec());
        match self.write_entry(&entry) {
            Ok(()) => info!(path = %self.path.display(), records = records.len(), "Saved copy of data"),
            Err(e) => error!(path = %self.path.display(), error = %e, "Could not save cache file"),
        }
        *state = Some(entry);
    }

    /// Forgets the in-memory snapshot and removes the cache file
    pub fn clear(&self) -> io::Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = None;
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    fn read_entry(&self) -> Result<CacheEntry, LoadFailure> {
        let content = fs::read_to_string(&self.path).map_err(LoadFailure::Io)?;
        serde_json::from_str(&content).map_err(LoadFailure::Corrupt)
    }

    /// Writes to a sibling temp file, then renames it over the cache file
    fn write_entry(&self, entry: &CacheEntry) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)
    }
}
