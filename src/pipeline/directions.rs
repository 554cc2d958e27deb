//! Direction frequency table of detected turning points.

use crate::binning::{DirectionHistogram, bin_records};
use crate::config::HistogramConfig;
use crate::error::Result;
use crate::loader::{ensure_exists, load_turning_point_directions};
use crate::models::ProcessingStats;
use crate::writer::write_direction_histogram;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug)]
pub struct DirectionReport {
    pub stats: ProcessingStats,
    pub histogram: DirectionHistogram,
}

pub struct DirectionHistogramProcessor {
    input_path: PathBuf,
    output_path: PathBuf,
    config: HistogramConfig,
}

impl DirectionHistogramProcessor {
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Result<Self> {
        ensure_exists(&input_path)?;

        Ok(Self {
            input_path,
            output_path,
            config: HistogramConfig::default(),
        })
    }

    pub fn with_config(mut self, config: HistogramConfig) -> Self {
        self.config = config;
        self
    }

    pub fn process(&self) -> Result<DirectionReport> {
        let start_time = Instant::now();

        let records = load_turning_point_directions(&self.input_path, &self.config)?;
        let histogram = bin_records(&records);
        if histogram.unbinned > 0 {
            warn!(
                "{} turning points have no usable direction",
                histogram.unbinned
            );
        }

        let rows_written = write_direction_histogram(&self.output_path, &histogram)?;
        info!(
            "Binned {} turning points into {} direction buckets",
            histogram.total(),
            histogram.bins.len()
        );

        Ok(DirectionReport {
            stats: ProcessingStats {
                rows_read: records.len(),
                rows_dropped: histogram.unbinned,
                rows_written,
                output_path: self.output_path.clone(),
                processing_time_ms: start_time.elapsed().as_millis(),
            },
            histogram,
        })
    }
}
