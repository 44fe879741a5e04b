//! CSV line parser for the "Tests, Cases, and Deaths (By Town)" data set
//!
//! Each line is split on commas into sixteen positional fields, sanitized
//! (empty tokens get safe defaults), converted and fed into a reusable
//! [`TownDataBuilder`].

use std::num::{ParseFloatError, ParseIntError};

use chrono::NaiveDate;
use thiserror::Error;

use super::{TownData, TownDataBuilder, ValidationError};

/// Value in the town number column that marks the header row
pub const HEADER_MARKER: &str = "Town number";

/// Date pattern used by the data set, e.g. `6/6/1966` or `05/26/2021`
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Substituted for an empty date field
pub const SENTINEL_DATE: &str = "06/06/1966";

/// Columns of the CSV file, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    LastUpdateDate,
    TownNumber,
    Town,
    TotalCases,
    ConfirmedCases,
    ProbableCases,
    CaseRate,
    TotalDeaths,
    ConfirmedDeaths,
    ProbableDeaths,
    PeopleTested,
    RateTestedPer100k,
    NumberOfTests,
    NumberOfPositives,
    NumberOfNegatives,
    NumberOfIndeterminates,
}

impl Column {
    /// Every column in the order it appears on a line
    pub const ALL: [Column; 16] = [
        Column::LastUpdateDate,
        Column::TownNumber,
        Column::Town,
        Column::TotalCases,
        Column::ConfirmedCases,
        Column::ProbableCases,
        Column::CaseRate,
        Column::TotalDeaths,
        Column::ConfirmedDeaths,
        Column::ProbableDeaths,
        Column::PeopleTested,
        Column::RateTestedPer100k,
        Column::NumberOfTests,
        Column::NumberOfPositives,
        Column::NumberOfNegatives,
        Column::NumberOfIndeterminates,
    ];

    /// Number of fields on a well-formed line
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this column on a line
    pub fn index(self) -> usize {
        self as usize
    }

    /// Default used when the field is empty, `None` if it stays empty
    fn empty_default(self) -> Option<&'static str> {
        match self {
            Column::Town => None,
            Column::LastUpdateDate => Some(SENTINEL_DATE),
            _ => Some("0"),
        }
    }
}

/// A field could not be converted after sanitization
#[derive(Debug, Error)]
pub enum ParseError {
    /// Integer column holds something other than an integer
    #[error("Invalid integer '{value}' in column {column:?}: {source}")]
    InvalidInteger {
        column: Column,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Real-valued column holds something other than a number
    #[error("Invalid number '{value}' in column {column:?}: {source}")]
    InvalidReal {
        column: Column,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    /// Date column does not match the expected pattern
    #[error("Invalid date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Converted values do not form a valid record
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Outcome of parsing a single line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// A valid data row
    Record(TownData),
    /// The header row
    Header,
    /// Wrong number of fields; the line carries no data
    Malformed { columns: usize },
}

/// Parses lines into [`TownData`] records, reusing one builder across lines
#[derive(Debug, Default)]
pub struct CsvParser {
    builder: TownDataBuilder,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one raw line
    ///
    /// # Returns
    /// * `Ok(ParsedLine::Record)` for a valid data row
    /// * `Ok(ParsedLine::Header)` / `Ok(ParsedLine::Malformed)` for lines to skip
    /// * `Err(ParseError)` if a sanitized field cannot be converted or fails validation
    pub fn parse_line(&mut self, line: &str) -> Result<ParsedLine, ParseError> {
        let mut parts: Vec<&str> = line.split(',').collect();
        if parts.len() != Column::COUNT {
            return Ok(ParsedLine::Malformed {
                columns: parts.len(),
            });
        }
        if parts[Column::TownNumber.index()] == HEADER_MARKER {
            return Ok(ParsedLine::Header);
        }

        sanitize(&mut parts);
        let field = |column: Column| parts[column.index()];

        self.builder.clear();
        self.builder
            .last_update_date(parse_date(field(Column::LastUpdateDate))?)
            .town_number(parse_integer(Column::TownNumber, field(Column::TownNumber))?)
            .town(field(Column::Town))
            .total_cases(parse_integer(Column::TotalCases, field(Column::TotalCases))?)
            .confirmed_cases(parse_integer(Column::ConfirmedCases, field(Column::ConfirmedCases))?)
            .probable_cases(parse_integer(Column::ProbableCases, field(Column::ProbableCases))?)
            .case_rate(parse_real(Column::CaseRate, field(Column::CaseRate))?)
            .total_deaths(parse_integer(Column::TotalDeaths, field(Column::TotalDeaths))?)
            .confirmed_deaths(parse_integer(Column::ConfirmedDeaths, field(Column::ConfirmedDeaths))?)
            .probable_deaths(parse_integer(Column::ProbableDeaths, field(Column::ProbableDeaths))?)
            .people_tested(parse_integer(Column::PeopleTested, field(Column::PeopleTested))?)
            .rate_tested_per_100k(parse_real(
                Column::RateTestedPer100k,
                field(Column::RateTestedPer100k),
            )?)
            .number_of_tests(parse_integer(Column::NumberOfTests, field(Column::NumberOfTests))?)
            .number_of_positives(parse_integer(
                Column::NumberOfPositives,
                field(Column::NumberOfPositives),
            )?)
            .number_of_negatives(parse_integer(
                Column::NumberOfNegatives,
                field(Column::NumberOfNegatives),
            )?)
            .number_of_indeterminates(parse_integer(
                Column::NumberOfIndeterminates,
                field(Column::NumberOfIndeterminates),
            )?);

        Ok(ParsedLine::Record(self.builder.build()?))
    }
}

/// Replaces empty fields with their column default
///
/// The town column is left alone; an empty town fails validation later.
fn sanitize(parts: &mut [&str]) {
    for (part, column) in parts.iter_mut().zip(Column::ALL) {
        if part.is_empty() {
            if let Some(default) = column.empty_default() {
                *part = default;
            }
        }
    }
}

fn parse_integer(column: Column, value: &str) -> Result<i64, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|source| ParseError::InvalidInteger {
            column,
            value: value.to_string(),
            source,
        })
}

fn parse_real(column: Column, value: &str) -> Result<f64, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|source| ParseError::InvalidReal {
            column,
            value: value.to_string(),
            source,
        })
}

fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| {
        ParseError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}
