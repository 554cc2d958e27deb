//! Antecedent precipitation index (recursive decay filter).
//!
//! First-order leaky integrator over a cleaned daily precipitation series:
//!
//! ```text
//! a[0] = 0
//! a[i] = p[i] + k * a[i-1]     for i >= 1
//! ```
//!
//! The first observation only seeds the timeline; its magnitude is not
//! folded into the index. Each output depends on the previous one, so the
//! recurrence runs as a single sequential pass.

use crate::error::{ProcessorError, Result};
use crate::models::{IndexPoint, TimePoint};
use crate::series::is_strictly_ascending;
use tracing::debug;

/// Compute the index for `precipitation` with decay constant `decay`,
/// flagging points whose index is strictly above `high_threshold`.
///
/// Fails with `InvalidInput` if the series is empty, is not in strictly
/// ascending date order, contains an absent or NaN value, or if `decay` is
/// not a finite number in `[0, 1]`.
pub fn antecedent_precipitation_index(
    precipitation: &[TimePoint],
    decay: f64,
    high_threshold: f64,
) -> Result<Vec<IndexPoint>> {
    if !decay.is_finite() || !(0.0..=1.0).contains(&decay) {
        return Err(ProcessorError::invalid_input(format!(
            "decay constant must lie in [0, 1], got {}",
            decay
        )));
    }

    if precipitation.is_empty() {
        return Err(ProcessorError::invalid_input(
            "precipitation series is empty",
        ));
    }

    if !is_strictly_ascending(precipitation) {
        return Err(ProcessorError::invalid_input(
            "precipitation dates must be strictly ascending; clean the series first",
        ));
    }

    let mut index = Vec::with_capacity(precipitation.len());
    let mut previous = 0.0;

    for (i, point) in precipitation.iter().enumerate() {
        let p = point.present_value().ok_or_else(|| {
            ProcessorError::invalid_input(format!(
                "absent precipitation value at {} (position {}); clean the series first",
                point.date, i
            ))
        })?;

        let value = if i == 0 { 0.0 } else { p + decay * previous };
        previous = value;

        index.push(IndexPoint {
            date: point.date,
            precipitation: p,
            value,
            is_high: value > high_threshold,
        });
    }

    debug!(
        "Computed API over {} days (k = {}), {} above {}",
        index.len(),
        decay,
        index.iter().filter(|p| p.is_high).count(),
        high_threshold
    );

    Ok(index)
}

/// Re-express an index series as plain time points for resampling
pub fn index_as_series(index: &[IndexPoint]) -> Vec<TimePoint> {
    index
        .iter()
        .map(|p| TimePoint::new(p.date, p.value))
        .collect()
}
