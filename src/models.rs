//! Core data structures shared by the filters, resampler and aligner.
//!
//! Defines the dated observation type, calendar month codes, the derived
//! index series, monthly aggregates and the turning-point records consumed
//! from the external detector's output tables.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single dated observation. `value` is `None` when the source cell was
/// missing or could not be coerced to a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl TimePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn absent(date: NaiveDate) -> Self {
        Self { date, value: None }
    }

    /// Value if present and finite
    pub fn present_value(&self) -> Option<f64> {
        self.value.filter(|v| !v.is_nan())
    }
}

/// Calendar month identifier (year + month), ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Create a month code, returning `None` for a month outside 1..=12 or
    /// a year outside the calendar's range
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(self) -> Option<NaiveDate> {
        self.first_day()?
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
    }

    /// Month code `offset` months after `self` (negative offsets go back).
    /// `None` when the result leaves the calendar's range.
    pub fn add_months(self, offset: i64) -> Option<Self> {
        let index = (self.year as i64)
            .checked_mul(12)?
            .checked_add(self.month as i64 - 1)?
            .checked_add(offset)?;
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        Self::new(year, (index.rem_euclid(12) + 1) as u32)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One point of the antecedent precipitation index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub precipitation: f64,
    pub value: f64,
    /// `value > threshold` for the threshold supplied to the filter
    pub is_high: bool,
}

/// Mean of all observations falling in one calendar month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyMean {
    pub month: YearMonth,
    pub mean: f64,
    pub count: usize,
}

/// A month code paired with its zero-based decimal-year offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalYear {
    pub month: YearMonth,
    pub offset: f64,
}

/// Row of a turning-point table produced by the external detector
#[derive(Debug, Clone, PartialEq)]
pub struct TurningPointRecord {
    pub id: String,
    /// Rate in mm/year
    pub direction: Option<f64>,
    pub slope: Option<f64>,
    pub date: Option<YearMonth>,
}

/// Satellite viewing geometry of a deformation dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orbit {
    Ascending,
    Descending,
}

impl fmt::Display for Orbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orbit::Ascending => write!(f, "Ascending"),
            Orbit::Descending => write!(f, "Descending"),
        }
    }
}

/// One spatial point of a resampled deformation table
#[derive(Debug, Clone, PartialEq)]
pub struct DeformationPoint {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub values: Vec<Option<f64>>,
}

/// Resampled deformation table: shared decimal-year axis plus one row per point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeformationTable {
    pub times: Vec<f64>,
    pub points: Vec<DeformationPoint>,
}

impl DeformationTable {
    pub fn find(&self, id: &str) -> Option<&DeformationPoint> {
        self.points.iter().find(|point| point.id == id)
    }
}

/// One row of the per-month turning-point counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
    pub month: YearMonth,
    pub descending: usize,
    pub ascending: usize,
}

impl MonthCount {
    pub fn count(&self, orbit: Orbit) -> usize {
        match orbit {
            Orbit::Ascending => self.ascending,
            Orbit::Descending => self.descending,
        }
    }

    pub fn total(&self) -> usize {
        self.descending + self.ascending
    }
}

/// Outcome of loading a flat file with lenient coercion
#[derive(Debug, Clone)]
pub struct LoadReport<T> {
    pub rows: Vec<T>,
    pub dropped: usize,
}

impl<T> Default for LoadReport<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            dropped: 0,
        }
    }
}

/// Summary statistics for a workflow run
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_written: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
