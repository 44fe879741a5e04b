//! Core data models for the town data CLI
//!
//! This module contains the per-town record type, the builder that validates it,
//! the CSV line parser, and the retriever that ties fetching and caching together.

pub mod builder;
pub mod parser;
pub mod retriever;
pub mod source;

pub use builder::{TownDataBuilder, ValidationError};
pub use parser::{Column, CsvParser, ParseError, ParsedLine};
pub use retriever::{RetrieveError, Retriever, RetrieverConfig};
pub use source::{DefaultOpener, FetchError, SourceOpener};

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Data sets published by the CT Data portal
///
/// See <https://data.ct.gov/stories/s/COVID-19-data/wa3g-tfvc/>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// COVID-19 Tests, Cases, and Deaths (By Town)
    TestsCasesAndDeathsByTown,
}

impl DataSource {
    /// URL of the full CSV download
    pub fn csv_download_url(&self) -> &'static str {
        match self {
            DataSource::TestsCasesAndDeathsByTown => {
                "https://data.ct.gov/api/views/28fr-iqnx/rows.csv?accessType=DOWNLOAD"
            }
        }
    }

    /// URL of the SODA JSON endpoint for the same data set
    pub fn soda_json_url(&self) -> &'static str {
        match self {
            DataSource::TestsCasesAndDeathsByTown => "https://data.ct.gov/resource/28fr-iqnx.json",
        }
    }

    /// Human-readable name of the data set
    pub fn description(&self) -> &'static str {
        match self {
            DataSource::TestsCasesAndDeathsByTown => "COVID-19 Tests, Cases, and Deaths (By Town)",
        }
    }
}

/// COVID-19 statistics for one town on one reporting date
///
/// Instances can only be created through [`TownDataBuilder::build`], which
/// rejects negative values, a missing date and a missing town. Deserialization
/// goes through the same builder, so records read back from the cache file are
/// validated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TownDataBuilder")]
pub struct TownData {
    pub(crate) last_update_date: NaiveDate,
    pub(crate) town_number: u32,
    pub(crate) town: String,
    pub(crate) total_cases: u64,
    pub(crate) confirmed_cases: u64,
    pub(crate) probable_cases: u64,
    pub(crate) case_rate: f64,
    pub(crate) total_deaths: u64,
    pub(crate) confirmed_deaths: u64,
    pub(crate) probable_deaths: u64,
    pub(crate) people_tested: u64,
    pub(crate) rate_tested_per_100k: f64,
    pub(crate) number_of_tests: u64,
    pub(crate) number_of_positives: u64,
    pub(crate) number_of_negatives: u64,
    pub(crate) number_of_indeterminates: u64,
}

impl TownData {
    pub fn last_update_date(&self) -> NaiveDate {
        self.last_update_date
    }

    pub fn town_number(&self) -> u32 {
        self.town_number
    }

    pub fn town(&self) -> &str {
        &self.town
    }

    pub fn total_cases(&self) -> u64 {
        self.total_cases
    }

    pub fn confirmed_cases(&self) -> u64 {
        self.confirmed_cases
    }

    pub fn probable_cases(&self) -> u64 {
        self.probable_cases
    }

    /// Cases per 100k residents
    pub fn case_rate(&self) -> f64 {
        self.case_rate
    }

    pub fn total_deaths(&self) -> u64 {
        self.total_deaths
    }

    pub fn confirmed_deaths(&self) -> u64 {
        self.confirmed_deaths
    }

    pub fn probable_deaths(&self) -> u64 {
        self.probable_deaths
    }

    pub fn people_tested(&self) -> u64 {
        self.people_tested
    }

    pub fn rate_tested_per_100k(&self) -> f64 {
        self.rate_tested_per_100k
    }

    pub fn number_of_tests(&self) -> u64 {
        self.number_of_tests
    }

    pub fn number_of_positives(&self) -> u64 {
        self.number_of_positives
    }

    pub fn number_of_negatives(&self) -> u64 {
        self.number_of_negatives
    }

    pub fn number_of_indeterminates(&self) -> u64 {
        self.number_of_indeterminates
    }
}

impl fmt::Display for TownData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} {}: total cases={} confirmed cases={} probable cases={} case rate={:.1} \
             total deaths={} confirmed deaths={} probable deaths={} people tested={} \
             tested per 100k={:.1} tests={} positives={} negatives={} indeterminates={}",
            self.last_update_date.format("%m/%d/%Y"),
            self.town_number,
            self.town,
            self.total_cases,
            self.confirmed_cases,
            self.probable_cases,
            self.case_rate,
            self.total_deaths,
            self.confirmed_deaths,
            self.probable_deaths,
            self.people_tested,
            self.rate_tested_per_100k,
            self.number_of_tests,
            self.number_of_positives,
            self.number_of_negatives,
            self.number_of_indeterminates,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TownData {
        TownDataBuilder::default()
            .last_update_date(NaiveDate::from_ymd_opt(2021, 5, 26).unwrap())
            .town_number(15)
            .town("Bridgeport")
            .total_cases(14_623)
            .confirmed_cases(13_402)
            .probable_cases(1_221)
            .case_rate(10_080.4)
            .total_deaths(384)
            .confirmed_deaths(330)
            .probable_deaths(54)
            .people_tested(116_789)
            .rate_tested_per_100k(80_510.6)
            .number_of_tests(412_054)
            .number_of_positives(16_007)
            .number_of_negatives(395_471)
            .number_of_indeterminates(576)
            .build()
            .unwrap()
    }

    #[test]
    fn test_data_source_urls() {
        let source = DataSource::TestsCasesAndDeathsByTown;
        assert!(source.csv_download_url().starts_with("https://data.ct.gov/"));
        assert!(source.csv_download_url().contains("28fr-iqnx"));
        assert!(source.soda_json_url().ends_with("28fr-iqnx.json"));
        assert!(source.description().contains("By Town"));
    }

    #[test]
    fn test_display_contains_town_and_counts() {
        let line = sample().to_string();
        assert!(line.starts_with("05/26/2021 #15 Bridgeport:"));
        assert!(line.contains("confirmed cases=13402"));
        assert!(line.contains("indeterminates=576"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let data = sample();

        let json = serde_json::to_string(&data).expect("Failed to serialize TownData");
        let deserialized: TownData =
            serde_json::from_str(&json).expect("Failed to deserialize TownData");

        assert_eq!(deserialized, data);
    }

    #[test]
    fn test_deserialization_rejects_invalid_record() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["town"] = serde_json::Value::String(String::new());

        let result: Result<TownData, _> = serde_json::from_value(value);
        assert!(result.is_err(), "Blank town must not deserialize");
    }

    #[test]
    fn test_deserialization_rejects_negative_count() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["total_deaths"] = serde_json::json!(-1);

        let result: Result<TownData, _> = serde_json::from_value(value);
        assert!(result.is_err(), "Negative count must not deserialize");
    }
}
