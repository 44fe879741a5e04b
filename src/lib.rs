//! Town Data CLI Library
//!
//! Downloads the CT "Tests, Cases, and Deaths (By Town)" data set, validates
//! every row, and keeps a day-long cache on disk. Modules are exposed for use
//! in integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod report;
