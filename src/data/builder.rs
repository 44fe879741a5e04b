//! Validating builder for [`TownData`]
//!
//! The builder accepts signed values so that a negative number read from the
//! CSV is caught here, with the field named, instead of disappearing into an
//! integer parse failure.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use super::TownData;

/// A builder field failed validation
#[derive(Debug, Error)]
#[error("Invalid value for '{field}': {snapshot}")]
pub struct ValidationError {
    /// Name of the first field that failed validation
    pub field: &'static str,
    /// Debug rendering of the builder at the time of the failure
    pub snapshot: String,
}

/// Accumulates the sixteen fields of a [`TownData`] record
///
/// Setters return `&mut Self` so the same instance can be filled, built and
/// [`cleared`](TownDataBuilder::clear) once per CSV row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TownDataBuilder {
    last_update_date: Option<NaiveDate>,
    town_number: i64,
    town: Option<String>,
    total_cases: i64,
    confirmed_cases: i64,
    probable_cases: i64,
    case_rate: f64,
    total_deaths: i64,
    confirmed_deaths: i64,
    probable_deaths: i64,
    people_tested: i64,
    rate_tested_per_100k: f64,
    number_of_tests: i64,
    number_of_positives: i64,
    number_of_negatives: i64,
    number_of_indeterminates: i64,
}

impl TownDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_update_date(&mut self, date: NaiveDate) -> &mut Self {
        self.last_update_date = Some(date);
        self
    }

    pub fn town_number(&mut self, town_number: i64) -> &mut Self {
        self.town_number = town_number;
        self
    }

    pub fn town(&mut self, town: impl Into<String>) -> &mut Self {
        self.town = Some(town.into());
        self
    }

    pub fn total_cases(&mut self, value: i64) -> &mut Self {
        self.total_cases = value;
        self
    }

    pub fn confirmed_cases(&mut self, value: i64) -> &mut Self {
        self.confirmed_cases = value;
        self
    }

    pub fn probable_cases(&mut self, value: i64) -> &mut Self {
        self.probable_cases = value;
        self
    }

    pub fn case_rate(&mut self, value: f64) -> &mut Self {
        self.case_rate = value;
        self
    }

    pub fn total_deaths(&mut self, value: i64) -> &mut Self {
        self.total_deaths = value;
        self
    }

    pub fn confirmed_deaths(&mut self, value: i64) -> &mut Self {
        self.confirmed_deaths = value;
        self
    }

    pub fn probable_deaths(&mut self, value: i64) -> &mut Self {
        self.probable_deaths = value;
        self
    }

    pub fn people_tested(&mut self, value: i64) -> &mut Self {
        self.people_tested = value;
        self
    }

    pub fn rate_tested_per_100k(&mut self, value: f64) -> &mut Self {
        self.rate_tested_per_100k = value;
        self
    }

    pub fn number_of_tests(&mut self, value: i64) -> &mut Self {
        self.number_of_tests = value;
        self
    }

    pub fn number_of_positives(&mut self, value: i64) -> &mut Self {
        self.number_of_positives = value;
        self
    }

    pub fn number_of_negatives(&mut self, value: i64) -> &mut Self {
        self.number_of_negatives = value;
        self
    }

    pub fn number_of_indeterminates(&mut self, value: i64) -> &mut Self {
        self.number_of_indeterminates = value;
        self
    }

    /// Resets every field to its default so the builder can be reused
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Validates the accumulated fields and produces a record
    ///
    /// # Returns
    /// * `Ok(TownData)` if the date and town are present and every number is non-negative
    /// * `Err(ValidationError)` naming the first field that is missing or negative
    pub fn build(&self) -> Result<TownData, ValidationError> {
        let last_update_date = self
            .last_update_date
            .ok_or_else(|| self.invalid("last_update_date"))?;
        let town = match self.town.as_deref().map(str::trim) {
            Some(town) if !town.is_empty() => town.to_string(),
            _ => return Err(self.invalid("town")),
        };
        let town_number =
            u32::try_from(self.town_number).map_err(|_| self.invalid("town_number"))?;

        Ok(TownData {
            last_update_date,
            town_number,
            town,
            total_cases: self.count("total_cases", self.total_cases)?,
            confirmed_cases: self.count("confirmed_cases", self.confirmed_cases)?,
            probable_cases: self.count("probable_cases", self.probable_cases)?,
            case_rate: self.rate("case_rate", self.case_rate)?,
            total_deaths: self.count("total_deaths", self.total_deaths)?,
            confirmed_deaths: self.count("confirmed_deaths", self.confirmed_deaths)?,
            probable_deaths: self.count("probable_deaths", self.probable_deaths)?,
            people_tested: self.count("people_tested", self.people_tested)?,
            rate_tested_per_100k: self.rate("rate_tested_per_100k", self.rate_tested_per_100k)?,
            number_of_tests: self.count("number_of_tests", self.number_of_tests)?,
            number_of_positives: self.count("number_of_positives", self.number_of_positives)?,
            number_of_negatives: self.count("number_of_negatives", self.number_of_negatives)?,
            number_of_indeterminates: self
                .count("number_of_indeterminates", self.number_of_indeterminates)?,
        })
    }

    fn count(&self, field: &'static str, value: i64) -> Result<u64, ValidationError> {
        u64::try_from(value).map_err(|_| self.invalid(field))
    }

    fn rate(&self, field: &'static str, value: f64) -> Result<f64, ValidationError> {
        // NaN and infinities have no JSON form, so the cache could not hold them
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(self.invalid(field))
        }
    }

    fn invalid(&self, field: &'static str) -> ValidationError {
        ValidationError {
            field,
            snapshot: format!("{:?}", self),
        }
    }
}

impl TryFrom<TownDataBuilder> for TownData {
    type Error = ValidationError;

    fn try_from(builder: TownDataBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> TownDataBuilder {
        let mut builder = TownDataBuilder::new();
        builder
            .last_update_date(NaiveDate::from_ymd_opt(2021, 5, 26).unwrap())
            .town_number(1)
            .town("Andover")
            .total_cases(202)
            .confirmed_cases(188)
            .probable_cases(14)
            .case_rate(6_201.4)
            .total_deaths(3)
            .confirmed_deaths(2)
            .probable_deaths(1)
            .people_tested(1_854)
            .rate_tested_per_100k(56_912.0)
            .number_of_tests(4_311)
            .number_of_positives(215)
            .number_of_negatives(4_087)
            .number_of_indeterminates(9);
        builder
    }

    #[test]
    fn test_build_valid_record() {
        let data = filled().build().expect("Builder should produce a record");

        assert_eq!(data.last_update_date(), NaiveDate::from_ymd_opt(2021, 5, 26).unwrap());
        assert_eq!(data.town_number(), 1);
        assert_eq!(data.town(), "Andover");
        assert_eq!(data.total_cases(), 202);
        assert_eq!(data.confirmed_cases(), 188);
        assert_eq!(data.probable_cases(), 14);
        assert!((data.case_rate() - 6_201.4).abs() < 0.001);
        assert_eq!(data.total_deaths(), 3);
        assert_eq!(data.confirmed_deaths(), 2);
        assert_eq!(data.probable_deaths(), 1);
        assert_eq!(data.people_tested(), 1_854);
        assert!((data.rate_tested_per_100k() - 56_912.0).abs() < 0.001);
        assert_eq!(data.number_of_tests(), 4_311);
        assert_eq!(data.number_of_positives(), 215);
        assert_eq!(data.number_of_negatives(), 4_087);
        assert_eq!(data.number_of_indeterminates(), 9);
    }

    #[test]
    fn test_build_fails_without_date() {
        let mut builder = filled();
        builder.last_update_date = None;

        let err = builder.build().unwrap_err();
        assert_eq!(err.field, "last_update_date");
    }

    #[test]
    fn test_build_fails_without_town() {
        let mut builder = filled();
        builder.town = None;
        assert_eq!(builder.build().unwrap_err().field, "town");

        builder.town("   ");
        assert_eq!(builder.build().unwrap_err().field, "town");
    }

    #[test]
    fn test_build_fails_for_each_negative_count() {
        let setters: [(&str, fn(&mut TownDataBuilder)); 13] = [
            ("town_number", |b| {
                b.town_number(-1);
            }),
            ("total_cases", |b| {
                b.total_cases(-1);
            }),
            ("confirmed_cases", |b| {
                b.confirmed_cases(-1);
            }),
            ("probable_cases", |b| {
                b.probable_cases(-1);
            }),
            ("total_deaths", |b| {
                b.total_deaths(-1);
            }),
            ("confirmed_deaths", |b| {
                b.confirmed_deaths(-1);
            }),
            ("probable_deaths", |b| {
                b.probable_deaths(-1);
            }),
            ("people_tested", |b| {
                b.people_tested(-1);
            }),
            ("number_of_tests", |b| {
                b.number_of_tests(-1);
            }),
            ("number_of_positives", |b| {
                b.number_of_positives(-1);
            }),
            ("number_of_negatives", |b| {
                b.number_of_negatives(-1);
            }),
            ("number_of_indeterminates", |b| {
                b.number_of_indeterminates(-1);
            }),
            ("case_rate", |b| {
                b.case_rate(-0.5);
            }),
        ];

        for (field, set_negative) in setters {
            let mut builder = filled();
            set_negative(&mut builder);
            let err = builder.build().expect_err(field);
            assert_eq!(err.field, field);
        }
    }

    #[test]
    fn test_build_rejects_negative_and_nan_rates() {
        let mut builder = filled();
        builder.rate_tested_per_100k(-1.0);
        assert_eq!(builder.build().unwrap_err().field, "rate_tested_per_100k");

        let mut builder = filled();
        builder.case_rate(f64::NAN);
        assert_eq!(builder.build().unwrap_err().field, "case_rate");
    }

    #[test]
    fn test_build_rejects_infinite_rates() {
        let mut builder = filled();
        builder.case_rate(f64::INFINITY);
        assert_eq!(builder.build().unwrap_err().field, "case_rate");

        let mut builder = filled();
        builder.rate_tested_per_100k(f64::NEG_INFINITY);
        assert_eq!(builder.build().unwrap_err().field, "rate_tested_per_100k");
    }

    #[test]
    fn test_validation_error_carries_snapshot() {
        let mut builder = filled();
        builder.probable_deaths(-7);

        let err = builder.build().unwrap_err();
        assert!(err.snapshot.contains("probable_deaths: -7"));
        assert!(err.to_string().contains("probable_deaths"));
    }

    #[test]
    fn test_clear_resets_all_fields() {
        let mut builder = filled();
        builder.clear();

        assert!(builder.last_update_date.is_none());
        assert!(builder.town.is_none());
        assert_eq!(builder.town_number, 0);
        assert_eq!(builder.total_cases, 0);
        assert_eq!(builder.number_of_indeterminates, 0);
        assert_eq!(builder.case_rate, 0.0);
        assert!(builder.build().is_err(), "A cleared builder has no date or town");
    }

    #[test]
    fn test_zero_values_are_valid() {
        let mut builder = TownDataBuilder::new();
        builder
            .last_update_date(NaiveDate::from_ymd_opt(1966, 6, 6).unwrap())
            .town("Union");

        let data = builder.build().expect("Zero counts are valid");
        assert_eq!(data.total_cases(), 0);
        assert_eq!(data.case_rate(), 0.0);
    }
}
