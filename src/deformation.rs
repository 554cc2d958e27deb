//! Wide deformation tables.
//!
//! A wide table has one row per measurement point and one column per survey
//! date (`D20110512`, ...), plus arbitrary identifier columns. Resampling
//! replaces the dated columns with one column per occupied calendar month,
//! headed by its decimal-year offset from the first month.

use crate::config::ResampleConfig;
use crate::error::{ProcessorError, Result};
use crate::loader::numeric_cells;
use crate::models::{DecimalYear, TimePoint, YearMonth};
use crate::resample::{decimal_years, format_decimal_year, monthly_mean};
use chrono::NaiveDate;
use polars::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// A dated column of a wide table
#[derive(Debug, Clone, PartialEq)]
pub struct TimeColumn {
    pub index: usize,
    pub name: String,
    pub date: NaiveDate,
}

/// Resampled table and the month axis its time columns were built from
#[derive(Debug, Clone)]
pub struct ResampledTable {
    pub frame: DataFrame,
    pub axis: Vec<DecimalYear>,
    pub source_columns: usize,
}

/// Locate the dated columns of `df`. A column is dated when its name is the
/// configured prefix followed by eight digits; such a name that is not a
/// valid date makes the table invalid.
pub fn time_columns(df: &DataFrame, config: &ResampleConfig, source: &Path) -> Result<Vec<TimeColumn>> {
    let pattern = Regex::new(&format!(r"^{}\d{{8}}$", regex::escape(&config.time_column_prefix)))
        .map_err(|e| ProcessorError::configuration(format!("invalid time column prefix: {}", e)))?;

    let mut found = Vec::new();
    for (index, name) in df.get_column_names().iter().enumerate() {
        let name = name.as_str();
        if !pattern.is_match(name) {
            continue;
        }

        let date = NaiveDate::parse_from_str(name, &config.time_column_format).map_err(|_| {
            ProcessorError::invalid_table(
                source,
                format!(
                    "column '{}' does not match date format {}",
                    name, config.time_column_format
                ),
            )
        })?;

        found.push(TimeColumn {
            index,
            name: name.to_string(),
            date,
        });
    }

    Ok(found)
}

/// Resample every row of a wide table to calendar-month means.
///
/// Identifier columns are carried through unchanged and in their original
/// order, followed by one column per month occupied by any survey date. A
/// row with no present sample in a month gets an empty cell there.
pub fn resample_wide_table(
    df: &DataFrame,
    config: &ResampleConfig,
    source: &Path,
) -> Result<ResampledTable> {
    let dated = time_columns(df, config, source)?;
    if dated.is_empty() {
        return Err(ProcessorError::invalid_table(
            source,
            format!(
                "no time-series columns named {}YYYYMMDD",
                config.time_column_prefix
            ),
        ));
    }

    let months: BTreeSet<YearMonth> = dated.iter().map(|c| YearMonth::of(c.date)).collect();
    let axis = decimal_years(months.iter().copied());

    let columns = df.get_columns();
    let samples = dated
        .iter()
        .map(|c| numeric_cells(&columns[c.index]))
        .collect::<Result<Vec<_>>>()?;

    let mut monthly: BTreeMap<YearMonth, Vec<Option<f64>>> = months
        .iter()
        .map(|month| (*month, Vec::with_capacity(df.height())))
        .collect();

    for row in 0..df.height() {
        let points: Vec<TimePoint> = dated
            .iter()
            .zip(&samples)
            .map(|(column, cells)| TimePoint {
                date: column.date,
                value: cells[row],
            })
            .collect();

        let means: BTreeMap<YearMonth, f64> = monthly_mean(&points)
            .into_iter()
            .map(|m| (m.month, m.mean))
            .collect();

        for (month, cells) in monthly.iter_mut() {
            cells.push(means.get(month).copied());
        }
    }

    let dated_indices: BTreeSet<usize> = dated.iter().map(|c| c.index).collect();
    let mut output: Vec<Column> = columns
        .iter()
        .enumerate()
        .filter(|(index, _)| !dated_indices.contains(index))
        .map(|(_, column)| column.clone())
        .collect();

    for year in &axis {
        let cells = monthly.remove(&year.month).unwrap_or_default();
        output.push(Column::new(format_decimal_year(year.offset).into(), cells));
    }

    debug!(
        "Resampled {} dated columns into {} monthly columns over {} rows",
        dated.len(),
        axis.len(),
        df.height()
    );

    Ok(ResampledTable {
        frame: DataFrame::new(output)?,
        axis,
        source_columns: dated.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_frame() -> DataFrame {
        df!(
            "ID" => ["P1", "P2"],
            "LAT" => ["42.0", "42.1"],
            "LON" => ["14.9", "15.0"],
            "D20110512" => ["1.0", "10.0"],
            "D20110524" => ["3.0", ""],
            "D20110605" => ["-2.0", "x"],
            "D20120501" => ["5.0", "7.5"]
        )
        .unwrap()
    }

    fn f64_cells(frame: &DataFrame, name: &str) -> Vec<Option<f64>> {
        frame
            .column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_time_columns_detected_by_pattern() {
        let found = time_columns(&wide_frame(), &ResampleConfig::default(), Path::new("t.csv")).unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["D20110512", "D20110524", "D20110605", "D20120501"]);
        assert_eq!(found[0].index, 3);
        assert_eq!(found[0].date, NaiveDate::from_ymd_opt(2011, 5, 12).unwrap());
    }

    #[test]
    fn test_invalid_dated_header_is_rejected() {
        let frame = df!("ID" => ["P1"], "D20111340" => ["1.0"]).unwrap();
        let err = time_columns(&frame, &ResampleConfig::default(), Path::new("t.csv")).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidTable { .. }));
    }

    #[test]
    fn test_resample_wide_table() {
        let resampled =
            resample_wide_table(&wide_frame(), &ResampleConfig::default(), Path::new("t.csv")).unwrap();
        let frame = &resampled.frame;

        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["ID", "LAT", "LON", "0.0", "0.08333333333333333", "1.0"]);
        assert_eq!(resampled.source_columns, 4);

        // May 2011 averages two surveys for P1; P2 has only one present value
        assert_eq!(f64_cells(frame, "0.0"), vec![Some(2.0), Some(10.0)]);
        assert_eq!(f64_cells(frame, "0.08333333333333333"), vec![Some(-2.0), None]);
        assert_eq!(f64_cells(frame, "1.0"), vec![Some(5.0), Some(7.5)]);
    }

    #[test]
    fn test_table_without_dated_columns() {
        let frame = df!("ID" => ["P1"], "LAT" => ["42.0"]).unwrap();
        let err = resample_wide_table(&frame, &ResampleConfig::default(), Path::new("t.csv")).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidTable { .. }));
    }
}
