//! Filtering and printing of retrieved town data

use std::io::{self, Write};

use crate::data::TownData;

/// Default confirmed-cases threshold used by the CLI
pub const DEFAULT_CONFIRMED_CASES_LIMIT: u64 = 10_000;

/// Predicate matching towns with more confirmed cases than `limit`
pub fn confirmed_cases_above(limit: u64) -> impl Fn(&TownData) -> bool {
    move |data| data.confirmed_cases() > limit
}

/// Writes one line per record that matches `predicate`
///
/// # Returns
/// * `Ok(usize)` - Number of records written
/// * `Err` if writing to `out` fails
pub fn print_data<W, P>(out: &mut W, data: &[TownData], predicate: P) -> io::Result<usize>
where
    W: Write,
    P: Fn(&TownData) -> bool,
{
    let mut printed = 0;
    for record in data {
        if predicate(record) {
            writeln!(out, "{}", record)?;
            printed += 1;
        }
    }
    Ok(printed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TownDataBuilder;
    use chrono::NaiveDate;

    fn town(name: &str, confirmed: i64) -> TownData {
        TownDataBuilder::new()
            .last_update_date(NaiveDate::from_ymd_opt(2021, 5, 26).unwrap())
            .town_number(1)
            .town(name)
            .confirmed_cases(confirmed)
            .build()
            .unwrap()
    }

    #[test]
    fn test_confirmed_cases_above_is_strict() {
        let predicate = confirmed_cases_above(10_000);
        assert!(!predicate(&town("Avon", 10_000)));
        assert!(predicate(&town("Bridgeport", 10_001)));
    }

    #[test]
    fn test_print_data_filters_and_keeps_order() {
        let data = vec![town("Bridgeport", 13_402), town("Avon", 700), town("Hartford", 12_950)];
        let mut out = Vec::new();

        let printed = print_data(&mut out, &data, confirmed_cases_above(DEFAULT_CONFIRMED_CASES_LIMIT))
            .expect("Writing to a Vec cannot fail");

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(printed, 2);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Bridgeport"));
        assert!(lines[1].contains("Hartford"));
    }

    #[test]
    fn test_print_data_with_no_matches() {
        let data = vec![town("Avon", 700)];
        let mut out = Vec::new();

        let printed = print_data(&mut out, &data, |_| false).unwrap();

        assert_eq!(printed, 0);
        assert!(out.is_empty());
    }
}
