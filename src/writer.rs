//! CSV output for derived series and summary tables.
//!
//! Every output is materialised as a polars `DataFrame` and written with a
//! header row. Dates are written as `%Y-%m-%d`; absent values as empty cells.

use crate::binning::DirectionHistogram;
use crate::constants::{OUTPUT_DATE_FORMAT, columns};
use crate::error::{ProcessorError, Result};
use crate::models::{IndexPoint, MonthCount, MonthlyMean, TimePoint};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Write `df` to `path`, creating missing parent directories
pub fn write_frame(path: &Path, df: &mut DataFrame) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(df.height())
}

/// Monthly index table `Date,API`, each month dated by its last day
pub fn write_api_monthly(path: &Path, months: &[MonthlyMean]) -> Result<usize> {
    let dates = months
        .iter()
        .map(|m| {
            m.month
                .last_day()
                .map(|day| day.format(OUTPUT_DATE_FORMAT).to_string())
                .ok_or_else(|| {
                    ProcessorError::invalid_input(format!("month {} has no calendar date", m.month))
                })
        })
        .collect::<Result<Vec<String>>>()?;
    let values: Vec<f64> = months.iter().map(|m| m.mean).collect();

    let mut df = df!(
        columns::DATE => dates,
        columns::API => values
    )?;
    write_frame(path, &mut df)
}

/// Daily index table `Date,Precipitation,API,High_API`
pub fn write_api_daily(path: &Path, points: &[IndexPoint]) -> Result<usize> {
    let dates: Vec<String> = points
        .iter()
        .map(|p| p.date.format(OUTPUT_DATE_FORMAT).to_string())
        .collect();
    let precipitation: Vec<f64> = points.iter().map(|p| p.precipitation).collect();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let high: Vec<bool> = points.iter().map(|p| p.is_high).collect();

    let mut df = df!(
        columns::DATE => dates,
        columns::PRECIPITATION => precipitation,
        columns::API => values,
        columns::HIGH_API => high
    )?;
    write_frame(path, &mut df)
}

/// Two-column dated series `Date,<value_column>`
pub fn write_series(path: &Path, points: &[TimePoint], value_column: &str) -> Result<usize> {
    let dates: Vec<String> = points
        .iter()
        .map(|p| p.date.format(OUTPUT_DATE_FORMAT).to_string())
        .collect();
    let values: Vec<Option<f64>> = points.iter().map(|p| p.present_value()).collect();

    let mut df = DataFrame::new(vec![
        Column::new(columns::DATE.into(), dates),
        Column::new(value_column.into(), values),
    ])?;
    write_frame(path, &mut df)
}

/// Direction frequency table `Bin,Total,Positive,Negative`, one row per bucket
pub fn write_direction_histogram(path: &Path, histogram: &DirectionHistogram) -> Result<usize> {
    let labels: Vec<&str> = histogram.bins.iter().map(|b| b.label).collect();
    let totals: Vec<u64> = histogram.bins.iter().map(|b| b.total as u64).collect();
    let positive: Vec<u64> = histogram.bins.iter().map(|b| b.positive as u64).collect();
    let negative: Vec<u64> = histogram.bins.iter().map(|b| b.negative as u64).collect();

    let mut df = df!(
        columns::BIN => labels,
        columns::TOTAL => totals,
        columns::POSITIVE => positive,
        columns::NEGATIVE => negative
    )?;
    write_frame(path, &mut df)
}

/// Turning-point timeline `Date,Descending,Ascending,Total`, months as `YYYY-MM`
pub fn write_turning_point_timeline(path: &Path, rows: &[MonthCount]) -> Result<usize> {
    let months: Vec<String> = rows.iter().map(|r| r.month.to_string()).collect();
    let descending: Vec<u64> = rows.iter().map(|r| r.descending as u64).collect();
    let ascending: Vec<u64> = rows.iter().map(|r| r.ascending as u64).collect();
    let totals: Vec<u64> = rows.iter().map(|r| r.total() as u64).collect();

    let mut df = df!(
        columns::DATE => months,
        columns::DESCENDING => descending,
        columns::ASCENDING => ascending,
        columns::TOTAL => totals
    )?;
    write_frame(path, &mut df)
}
