//! Direction histogram of detected turning points.
//!
//! Buckets are left-closed and right-open: `(-inf, -10)`, `[-10, -8)`, ...,
//! `[8, 10)`, `[10, +inf)`. A value on an edge therefore lands in the bucket
//! that starts at that edge (`-10` in `[-10 -8)`, `10` in `> 10`). NaN and
//! `+inf` fall in no bucket.

use crate::constants::{DIRECTION_EDGES, DIRECTION_LABELS};
use crate::models::TurningPointRecord;
use tracing::debug;

/// Counts for one direction bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionBin {
    pub label: &'static str,
    pub total: usize,
    /// Records in this bucket whose slope is >= 0
    pub positive: usize,
    /// Records in this bucket whose slope is < 0
    pub negative: usize,
}

/// Frequency table over all direction buckets, lowest bucket first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionHistogram {
    pub bins: Vec<DirectionBin>,
    /// Records with an absent or unbinnable direction
    pub unbinned: usize,
}

impl DirectionHistogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.total).sum()
    }

    pub fn get(&self, label: &str) -> Option<&DirectionBin> {
        self.bins.iter().find(|b| b.label == label)
    }
}

/// Index of the bucket holding `direction`, if any
pub fn bucket_index(direction: f64) -> Option<usize> {
    if direction.is_nan() || direction == f64::INFINITY {
        return None;
    }
    // Number of edges <= value equals the bucket index for [lo, hi) buckets
    Some(DIRECTION_EDGES.partition_point(|edge| *edge <= direction))
}

/// Count (direction, slope) pairs per bucket. Slope splits each bucket into
/// non-negative and negative counts; an absent slope counts toward the total
/// only.
pub fn bin_directions<I>(pairs: I) -> DirectionHistogram
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    let mut bins: Vec<DirectionBin> = DIRECTION_LABELS
        .iter()
        .map(|&label| DirectionBin {
            label,
            total: 0,
            positive: 0,
            negative: 0,
        })
        .collect();
    let mut unbinned = 0;

    for (direction, slope) in pairs {
        let Some(index) = direction.and_then(bucket_index) else {
            unbinned += 1;
            continue;
        };

        let bin = &mut bins[index];
        bin.total += 1;
        match slope {
            Some(s) if s >= 0.0 => bin.positive += 1,
            Some(s) if s < 0.0 => bin.negative += 1,
            _ => {}
        }
    }

    debug!(
        "Binned {} directions, {} unbinned",
        bins.iter().map(|b| b.total).sum::<usize>(),
        unbinned
    );

    DirectionHistogram { bins, unbinned }
}

/// Histogram of a turning-point table
pub fn bin_records(records: &[TurningPointRecord]) -> DirectionHistogram {
    bin_directions(records.iter().map(|r| (r.direction, r.slope)))
}
