//! Monthly API aligned with deformation survey epochs.

use crate::align::{filter_near_dates, pair_with_nearest_epoch, pearson, survey_epochs};
use crate::config::ProcessorConfig;
use crate::constants::columns;
use crate::detector::{PointAnalysis, TurningPointDetector, analyze_point};
use crate::error::{ProcessorError, Result};
use crate::loader::{ensure_exists, load_api_monthly, load_deformation_table};
use crate::models::{DeformationTable, ProcessingStats, TimePoint};
use crate::writer::write_series;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One point's deformation series compared with the aligned API
#[derive(Debug, Clone, PartialEq)]
pub struct PointSummary {
    pub id: String,
    pub present_samples: usize,
    pub total_samples: usize,
    pub high_api_months: usize,
    pub correlation: Option<f64>,
}

#[derive(Debug)]
pub struct AlignmentReport {
    pub stats: ProcessingStats,
    pub epochs: usize,
    pub retained: Vec<TimePoint>,
    pub point: Option<PointSummary>,
    pub analysis: Option<PointAnalysis>,
}

pub struct AlignmentProcessor {
    api_path: PathBuf,
    deformation_path: PathBuf,
    output_path: PathBuf,
    point_id: Option<String>,
    point_output: Option<PathBuf>,
    detector: Option<Box<dyn TurningPointDetector>>,
    config: ProcessorConfig,
}

impl AlignmentProcessor {
    pub fn new(api_path: PathBuf, deformation_path: PathBuf, output_path: PathBuf) -> Result<Self> {
        ensure_exists(&api_path)?;
        ensure_exists(&deformation_path)?;

        Ok(Self {
            api_path,
            deformation_path,
            output_path,
            point_id: None,
            point_output: None,
            detector: None,
            config: ProcessorConfig::default(),
        })
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Compare the API with the series of one measurement point
    pub fn with_point(mut self, id: impl Into<String>) -> Self {
        self.point_id = Some(id.into());
        self
    }

    /// Write the selected point's series as `Date,Deformation`
    pub fn with_point_output(mut self, path: PathBuf) -> Self {
        self.point_output = Some(path);
        self
    }

    /// Run turning-point detection on the selected point
    pub fn with_detector(mut self, detector: Box<dyn TurningPointDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn process(&self) -> Result<AlignmentReport> {
        let start_time = Instant::now();

        let api = load_api_monthly(&self.api_path)?;
        let table = load_deformation_table(&self.deformation_path, &self.config.resample)?;
        let epochs = survey_epochs(&table.times, self.config.align.survey_start)?;
        debug!(
            "Survey epochs run from {:?} to {:?}",
            epochs.first(),
            epochs.last()
        );

        let retained = filter_near_dates(&api.rows, &epochs, self.config.align.threshold_days)?;
        if retained.is_empty() {
            warn!(
                "No API month lies within {} days of a survey epoch",
                self.config.align.threshold_days
            );
        }
        let rows_written = write_series(&self.output_path, &retained, columns::API)?;

        let analysis = match (&self.point_id, &self.detector) {
            (Some(id), Some(detector)) => Some(analyze_point(
                &table,
                id,
                &api.rows,
                detector.as_ref(),
                &self.config,
            )?),
            _ => None,
        };

        let point = match &self.point_id {
            Some(id) => Some(self.summarize_point(
                &table,
                id,
                &epochs,
                &retained,
                analysis.as_ref(),
            )?),
            None => None,
        };

        info!(
            "Aligned {} of {} API months with {} survey epochs",
            retained.len(),
            api.rows.len(),
            epochs.len()
        );

        Ok(AlignmentReport {
            stats: ProcessingStats {
                rows_read: api.rows.len() + api.dropped,
                rows_dropped: api.dropped + (api.rows.len() - retained.len()),
                rows_written,
                output_path: self.output_path.clone(),
                processing_time_ms: start_time.elapsed().as_millis(),
            },
            epochs: epochs.len(),
            retained,
            point,
            analysis,
        })
    }

    /// Summary of one point. Comparison figures come from `analysis` when
    /// the detector already produced them.
    fn summarize_point(
        &self,
        table: &DeformationTable,
        id: &str,
        epochs: &[NaiveDate],
        retained: &[TimePoint],
        analysis: Option<&PointAnalysis>,
    ) -> Result<PointSummary> {
        let point = table.find(id).ok_or_else(|| {
            ProcessorError::invalid_input(format!("ID '{}' not found in the dataset", id))
        })?;

        if let Some(path) = &self.point_output {
            let series: Vec<TimePoint> = epochs
                .iter()
                .zip(&point.values)
                .map(|(date, value)| TimePoint {
                    date: *date,
                    value: *value,
                })
                .collect();
            write_series(path, &series, columns::DEFORMATION)?;
        }

        let (high_api_months, correlation) = match analysis {
            Some(analysis) => (analysis.high_api_months, analysis.correlation),
            None => {
                let high_api_months = retained
                    .iter()
                    .filter_map(|p| p.present_value())
                    .filter(|v| *v >= self.config.align.display_threshold)
                    .count();
                let correlation = if retained.is_empty() {
                    None
                } else {
                    let (xs, ys) = pair_with_nearest_epoch(retained, epochs, &point.values)?;
                    pearson(&xs, &ys)?
                };
                (high_api_months, correlation)
            }
        };

        Ok(PointSummary {
            id: point.id.clone(),
            present_samples: point.values.iter().filter(|v| v.is_some()).count(),
            total_samples: point.values.len(),
            high_api_months,
            correlation,
        })
    }
}
