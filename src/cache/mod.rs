//! Cache module for storing downloaded town data on disk
//!
//! This module provides a cache manager that keeps the last fetched collection
//! in a single JSON file together with its fetch timestamp. Entries older than
//! the freshness window are ignored, and every cache failure is logged and
//! treated as a miss so caching never breaks a retrieval.

mod manager;

pub use manager::{CacheEntry, CacheManager, CACHE_FILE_NAME, TOO_OLD_DAYS};
