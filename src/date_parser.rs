//! Multi-format date parsing with century correction.
//!
//! A column of date strings is parsed under a single format chosen from an
//! ordered candidate list: the first format under which at least one value
//! parses wins, and every value is parsed with that format only. Values that
//! fail under the chosen format become absent; they are not retried against
//! later candidates.
//!
//! Formats without a day field (`%y-%b`, `%b-%y`, `%Y-%m`) resolve to the
//! first day of the month.

use crate::constants::CENTURY_PIVOT_YEAR;
use crate::error::{ProcessorError, Result};
use crate::models::YearMonth;
use chrono::format::{Parsed, StrftimeItems, parse};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

/// Parsed column together with the format that was selected
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDates {
    /// Selected format; `None` only for an empty input column
    pub format: Option<String>,
    pub dates: Vec<Option<NaiveDate>>,
}

impl ParsedDates {
    pub fn parsed_count(&self) -> usize {
        self.dates.iter().filter(|d| d.is_some()).count()
    }

    pub fn absent_count(&self) -> usize {
        self.dates.len() - self.parsed_count()
    }

    /// Month codes of the parsed dates, absent entries preserved
    pub fn months(&self) -> Vec<Option<YearMonth>> {
        self.dates.iter().map(|d| d.map(YearMonth::of)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct MultiFormatDateParser {
    formats: Vec<String>,
    century_correction: bool,
}

impl MultiFormatDateParser {
    /// Parser over `formats`, tried in the given order, with century
    /// correction enabled
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            formats: formats.into_iter().map(Into::into).collect(),
            century_correction: true,
        }
    }

    /// Disable the post-parse shift of pre-2000 years
    pub fn without_century_correction(mut self) -> Self {
        self.century_correction = false;
        self
    }

    /// Parse every value (trimmed) under the first format that yields at
    /// least one date.
    ///
    /// Fails with `NoMatchingFormat` when the column is non-empty and no
    /// candidate parses any value.
    pub fn parse<S: AsRef<str>>(&self, values: &[S]) -> Result<ParsedDates> {
        if values.is_empty() {
            return Ok(ParsedDates {
                format: None,
                dates: Vec::new(),
            });
        }

        let trimmed: Vec<&str> = values.iter().map(|v| v.as_ref().trim()).collect();

        for format in &self.formats {
            let dates: Vec<Option<NaiveDate>> = trimmed
                .iter()
                .map(|value| parse_with_format(value, format))
                .collect();

            let parsed = dates.iter().filter(|d| d.is_some()).count();
            if parsed == 0 {
                debug!("Format {} matched none of {} values", format, values.len());
                continue;
            }

            info!(
                "Using format {} for parsing ({} of {} values)",
                format,
                parsed,
                values.len()
            );

            let dates = if self.century_correction {
                dates
                    .into_iter()
                    .map(|d| d.and_then(correct_century))
                    .collect()
            } else {
                dates
            };

            return Ok(ParsedDates {
                format: Some(format.clone()),
                dates,
            });
        }

        Err(ProcessorError::NoMatchingFormat {
            formats: self.formats.clone(),
            sample_count: values.len(),
        })
    }
}

/// Parse a single value under one format. Missing day fields default to 1.
pub fn parse_with_format(value: &str, format: &str) -> Option<NaiveDate> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, value, StrftimeItems::new(format)).ok()?;

    if let Ok(date) = parsed.to_naive_date() {
        return Some(date);
    }

    parsed.set_day(1).ok()?;
    parsed.to_naive_date().ok()
}

/// Shift a date before 2000 forward by one century; two-digit years are
/// taken to lie in 2000-2099.
pub fn correct_century(date: NaiveDate) -> Option<NaiveDate> {
    if date.year() < CENTURY_PIVOT_YEAR {
        date.with_year(date.year() + 100)
    } else {
        Some(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn turning_point_parser() -> MultiFormatDateParser {
        MultiFormatDateParser::new(["%y-%b", "%b-%y"])
    }

    #[test]
    fn test_first_format_with_any_success_wins() {
        let result = turning_point_parser().parse(&["21-Jan", "bad"]).unwrap();
        assert_eq!(result.format.as_deref(), Some("%y-%b"));
        assert_eq!(result.dates, vec![Some(ymd(2021, 1, 1)), None]);
    }

    #[test]
    fn test_failures_are_not_retried_with_later_formats() {
        // "Mar-19" would parse under %b-%y but the first format already matched
        let result = turning_point_parser().parse(&["19-Feb", "Mar-19"]).unwrap();
        assert_eq!(result.format.as_deref(), Some("%y-%b"));
        assert_eq!(result.dates, vec![Some(ymd(2019, 2, 1)), None]);
        assert_eq!(result.absent_count(), 1);
    }

    #[test]
    fn test_falls_through_to_second_format() {
        let result = turning_point_parser().parse(&["Jan-21", " Dec-15 "]).unwrap();
        assert_eq!(result.format.as_deref(), Some("%b-%y"));
        assert_eq!(result.dates, vec![Some(ymd(2021, 1, 1)), Some(ymd(2015, 12, 1))]);
    }

    #[test]
    fn test_no_matching_format() {
        let err = turning_point_parser().parse(&["bad", "worse"]).unwrap_err();
        match err {
            ProcessorError::NoMatchingFormat {
                formats,
                sample_count,
            } => {
                assert_eq!(formats, vec!["%y-%b", "%b-%y"]);
                assert_eq!(sample_count, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_column_is_not_an_error() {
        let empty: [&str; 0] = [];
        let result = turning_point_parser().parse(&empty).unwrap();
        assert!(result.dates.is_empty());
        assert_eq!(result.format, None);
    }

    #[test]
    fn test_century_correction() {
        // chrono resolves two-digit years 70-99 into the 1900s
        let result = turning_point_parser().parse(&["99-Jan", "21-Jan"]).unwrap();
        assert_eq!(result.dates, vec![Some(ymd(2099, 1, 1)), Some(ymd(2021, 1, 1))]);

        let four_digit = MultiFormatDateParser::new(["%Y-%m-%d"])
            .parse(&["1995-06-15"])
            .unwrap();
        assert_eq!(four_digit.dates, vec![Some(ymd(2095, 6, 15))]);
    }

    #[test]
    fn test_century_correction_can_be_disabled() {
        let result = MultiFormatDateParser::new(["%Y-%m-%d"])
            .without_century_correction()
            .parse(&["1995-06-15"])
            .unwrap();
        assert_eq!(result.dates, vec![Some(ymd(1995, 6, 15))]);
    }

    #[test]
    fn test_parse_with_format_month_resolution() {
        assert_eq!(parse_with_format("2011-05", "%Y-%m"), Some(ymd(2011, 5, 1)));
        assert_eq!(parse_with_format("2011-05-17", "%Y-%m"), None);
        assert_eq!(parse_with_format("17/05/2011", "%d/%m/%Y"), Some(ymd(2011, 5, 17)));
        assert_eq!(parse_with_format("31/02/2011", "%d/%m/%Y"), None);
    }

    #[test]
    fn test_months_projection() {
        let result = turning_point_parser().parse(&["21-Jan", "bad"]).unwrap();
        assert_eq!(
            result.months(),
            vec![Some(YearMonth { year: 2021, month: 1 }), None]
        );
    }
}
