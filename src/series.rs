//! Series cleaning.
//!
//! Turns a raw, possibly unordered sequence of dated observations into the
//! form the filter and resampler require: no absent values, ascending dates,
//! no duplicate dates, restricted to an inclusive date window.

use crate::models::TimePoint;
use chrono::NaiveDate;
use tracing::debug;

/// Result of cleaning a series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedSeries {
    pub points: Vec<TimePoint>,
    pub dropped_absent: usize,
    pub dropped_duplicate: usize,
    pub dropped_outside_window: usize,
}

impl CleanedSeries {
    pub fn dropped(&self) -> usize {
        self.dropped_absent + self.dropped_duplicate + self.dropped_outside_window
    }
}

/// Clean `points` and keep only dates within `[start, end]`.
///
/// For repeated dates the first occurrence in input order is kept.
pub fn clean_series(points: &[TimePoint], start: NaiveDate, end: NaiveDate) -> CleanedSeries {
    let mut present: Vec<TimePoint> = points
        .iter()
        .filter(|p| p.present_value().is_some())
        .copied()
        .collect();
    let dropped_absent = points.len() - present.len();

    // Stable sort keeps the first occurrence ahead of later duplicates
    present.sort_by_key(|p| p.date);
    let before_dedup = present.len();
    present.dedup_by_key(|p| p.date);
    let dropped_duplicate = before_dedup - present.len();

    let before_window = present.len();
    present.retain(|p| p.date >= start && p.date <= end);
    let dropped_outside_window = before_window - present.len();

    debug!(
        "Cleaned series: kept {}, dropped {} absent, {} duplicate, {} outside {}..={}",
        present.len(),
        dropped_absent,
        dropped_duplicate,
        dropped_outside_window,
        start,
        end
    );

    CleanedSeries {
        points: present,
        dropped_absent,
        dropped_duplicate,
        dropped_outside_window,
    }
}

/// True when dates are strictly increasing
pub fn is_strictly_ascending(points: &[TimePoint]) -> bool {
    points.windows(2).all(|pair| pair[0].date < pair[1].date)
}
