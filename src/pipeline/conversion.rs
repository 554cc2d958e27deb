//! Wide deformation table to monthly decimal-year table.

use crate::config::ResampleConfig;
use crate::deformation::resample_wide_table;
use crate::error::Result;
use crate::loader::{ensure_exists, read_text_table};
use crate::models::{DecimalYear, ProcessingStats};
use crate::writer::write_frame;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Debug)]
pub struct ResampleReport {
    pub stats: ProcessingStats,
    /// Dated columns in the input table
    pub source_columns: usize,
    pub axis: Vec<DecimalYear>,
}

pub struct ResampleProcessor {
    input_path: PathBuf,
    output_path: PathBuf,
    config: ResampleConfig,
}

impl ResampleProcessor {
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Result<Self> {
        ensure_exists(&input_path)?;

        Ok(Self {
            input_path,
            output_path,
            config: ResampleConfig::default(),
        })
    }

    pub fn with_config(mut self, config: ResampleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn process(&self) -> Result<ResampleReport> {
        let start_time = Instant::now();

        let df = read_text_table(&self.input_path, true)?;
        let rows_read = df.height();

        let mut resampled = resample_wide_table(&df, &self.config, &self.input_path)?;
        let rows_written = write_frame(&self.output_path, &mut resampled.frame)?;

        info!(
            "Resampled {} survey dates to {} months for {} points",
            resampled.source_columns,
            resampled.axis.len(),
            rows_written
        );

        Ok(ResampleReport {
            stats: ProcessingStats {
                rows_read,
                rows_dropped: 0,
                rows_written,
                output_path: self.output_path.clone(),
                processing_time_ms: start_time.elapsed().as_millis(),
            },
            source_columns: resampled.source_columns,
            axis: resampled.axis,
        })
    }
}
