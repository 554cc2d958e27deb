//! Nearest-date alignment of independently sampled series.
//!
//! Keeps the points of one series that lie within a day threshold of the
//! closest date in a reference set (e.g. monthly API values against
//! deformation survey epochs). Also provides the linear correlation used to
//! compare the aligned series.

use crate::constants::MAX_DECIMAL_YEAR;
use crate::error::{ProcessorError, Result};
use crate::models::{TimePoint, YearMonth};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Sorted reference dates supporting nearest-distance lookups
#[derive(Debug, Clone)]
pub struct ReferenceDates {
    sorted: Vec<NaiveDate>,
}

impl ReferenceDates {
    /// Build from an arbitrary, possibly unordered, set of dates.
    /// An empty set is rejected: no distance is defined against it.
    pub fn new(dates: &[NaiveDate]) -> Result<Self> {
        if dates.is_empty() {
            return Err(ProcessorError::invalid_input(
                "reference date set is empty",
            ));
        }
        let mut sorted = dates.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        Ok(Self { sorted })
    }

    /// Absolute distance in days to the closest reference date
    pub fn distance_days(&self, date: NaiveDate) -> i64 {
        let idx = self.sorted.partition_point(|d| *d < date);
        let after = self.sorted.get(idx).map(|d| (*d - date).num_days());
        let before = idx
            .checked_sub(1)
            .and_then(|i| self.sorted.get(i))
            .map(|d| (date - *d).num_days());

        match (before, after) {
            (Some(b), Some(a)) => b.min(a),
            (Some(b), None) => b,
            (None, Some(a)) => a,
            // unreachable for a non-empty set
            (None, None) => i64::MAX,
        }
    }

    /// Closest reference date; on an exact tie the earlier date is returned
    pub fn nearest(&self, date: NaiveDate) -> NaiveDate {
        let idx = self.sorted.partition_point(|d| *d < date);
        match (idx.checked_sub(1).map(|i| self.sorted[i]), self.sorted.get(idx)) {
            (Some(b), Some(&a)) => {
                if (date - b).num_days() <= (a - date).num_days() {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(&a)) => a,
            (None, None) => date,
        }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

/// Keep the points of `series` whose distance to the nearest date in
/// `reference` is at most `threshold_days`. Retained points keep their
/// values and their original relative order.
pub fn filter_near_dates(
    series: &[TimePoint],
    reference: &[NaiveDate],
    threshold_days: u32,
) -> Result<Vec<TimePoint>> {
    let reference = ReferenceDates::new(reference)?;
    let threshold = i64::from(threshold_days);

    let retained: Vec<TimePoint> = series
        .iter()
        .filter(|point| reference.distance_days(point.date) <= threshold)
        .copied()
        .collect();

    debug!(
        "Aligned {} of {} points within {} days of {} reference dates",
        retained.len(),
        series.len(),
        threshold_days,
        reference.len()
    );

    Ok(retained)
}

/// Survey epoch dates for a decimal-year axis: the first day of the month
/// `round(t * 12)` months after `start`.
///
/// Fails with `InvalidInput` for a non-finite offset or one that lands
/// outside the calendar's range.
pub fn survey_epochs(times: &[f64], start: YearMonth) -> Result<Vec<NaiveDate>> {
    times
        .iter()
        .map(|&t| {
            let months = (t * 12.0).round();
            if !months.is_finite() || months.abs() > MAX_DECIMAL_YEAR * 12.0 {
                return Err(ProcessorError::invalid_input(format!(
                    "decimal year {} is outside the survey calendar",
                    t
                )));
            }
            start
                .add_months(months as i64)
                .and_then(YearMonth::first_day)
                .ok_or_else(|| {
                    ProcessorError::invalid_input(format!(
                        "decimal year {} from {} is outside the survey calendar",
                        t, start
                    ))
                })
        })
        .collect()
}

/// Pair each point's value with the sample at its nearest epoch, skipping
/// points without a value on either side. `samples[i]` belongs to
/// `epochs[i]`; for repeated epochs the first sample is used.
pub fn pair_with_nearest_epoch(
    points: &[TimePoint],
    epochs: &[NaiveDate],
    samples: &[Option<f64>],
) -> Result<(Vec<f64>, Vec<f64>)> {
    if epochs.len() != samples.len() {
        return Err(ProcessorError::invalid_input(format!(
            "{} epochs but {} samples",
            epochs.len(),
            samples.len()
        )));
    }

    let reference = ReferenceDates::new(epochs)?;
    let mut by_epoch: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    for (epoch, sample) in epochs.iter().zip(samples) {
        by_epoch.entry(*epoch).or_insert(*sample);
    }

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for point in points {
        let nearest = reference.nearest(point.date);
        let sample = by_epoch
            .get(&nearest)
            .copied()
            .flatten()
            .filter(|v| !v.is_nan());
        if let (Some(x), Some(y)) = (point.present_value(), sample) {
            xs.push(x);
            ys.push(y);
        }
    }

    Ok((xs, ys))
}

/// Pearson correlation coefficient of two equally long samples.
///
/// Returns `Ok(None)` when fewer than two pairs are given or either sample
/// has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<Option<f64>> {
    if xs.len() != ys.len() {
        return Err(ProcessorError::invalid_input(format!(
            "correlation samples differ in length: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }

    let n = xs.len();
    if n < 2 {
        return Ok(None);
    }

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Ok(None);
    }

    Ok(Some(cov / (var_x.sqrt() * var_y.sqrt())))
}
