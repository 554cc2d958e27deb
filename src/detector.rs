//! Turning-point detection seam and single-point analysis.
//!
//! The detection algorithm and its trend estimator are external: they are
//! reached only through [`TurningPointDetector`], whose parameters are
//! carried opaquely in [`DetectorConfig`]. [`analyze_point`] prepares one
//! deformation series for the detector, validates what comes back, and
//! lines the result up with the filtered API series.

use crate::align::{filter_near_dates, pair_with_nearest_epoch, pearson, survey_epochs};
use crate::config::{DetectorConfig, ProcessorConfig};
use crate::error::{ProcessorError, Result};
use crate::models::{DeformationTable, TimePoint};
use chrono::NaiveDate;
use tracing::{debug, info};

/// Per-turning-point statistics reported by the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurningPointStats {
    /// Rate change at the turning point (mm/year)
    pub direction: f64,
    /// Normalized difference ratio index at the turning point
    pub ndri: f64,
}

/// Detector output: positions into the submitted series, one stats entry
/// per position, and the fitted trend (same length as the series, or empty
/// when no turning point was found).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub turning_points: Vec<usize>,
    pub stats: Vec<TurningPointStats>,
    pub trend: Vec<f64>,
}

pub trait TurningPointDetector {
    fn detect(&self, times: &[f64], values: &[f64], config: &DetectorConfig) -> Result<Detection>;
}

impl<F> TurningPointDetector for F
where
    F: Fn(&[f64], &[f64], &DetectorConfig) -> Result<Detection>,
{
    fn detect(&self, times: &[f64], values: &[f64], config: &DetectorConfig) -> Result<Detection> {
        self(times, values, config)
    }
}

/// A turning point placed on the survey timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TurningPointMark {
    /// Column index in the deformation table
    pub sample_index: usize,
    pub date: NaiveDate,
    pub value: f64,
    pub stats: TurningPointStats,
}

/// Everything needed to compare one point's deformation with the API
#[derive(Debug, Clone, PartialEq)]
pub struct PointAnalysis {
    pub id: String,
    pub epochs: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
    pub turning_points: Vec<TurningPointMark>,
    /// Trend over the present samples, indexed like `sample_indices`
    pub trend: Vec<f64>,
    pub sample_indices: Vec<usize>,
    /// API months within the alignment threshold of a survey epoch
    pub filtered_api: Vec<TimePoint>,
    /// Filtered API months at or above the display threshold
    pub high_api_months: usize,
    /// Correlation of filtered API with deformation at the nearest epoch
    pub correlation: Option<f64>,
}

/// Run the detector on the series of point `id` and align it with the
/// monthly API series.
pub fn analyze_point<D: TurningPointDetector + ?Sized>(
    table: &DeformationTable,
    id: &str,
    api_monthly: &[TimePoint],
    detector: &D,
    config: &ProcessorConfig,
) -> Result<PointAnalysis> {
    let point = table
        .find(id)
        .ok_or_else(|| ProcessorError::invalid_input(format!("ID '{}' not found in the dataset", id)))?;

    if point.values.len() != table.times.len() {
        return Err(ProcessorError::invalid_input(format!(
            "point '{}' has {} samples for {} survey epochs",
            id,
            point.values.len(),
            table.times.len()
        )));
    }

    let epochs = survey_epochs(&table.times, config.align.survey_start)?;

    let mut sample_indices = Vec::new();
    let mut times = Vec::new();
    let mut values = Vec::new();
    for (i, value) in point.values.iter().enumerate() {
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            sample_indices.push(i);
            times.push(table.times[i]);
            values.push(v);
        }
    }

    debug!(
        "Point {}: {} of {} samples present",
        id,
        values.len(),
        point.values.len()
    );

    let detection = detector.detect(&times, &values, &config.detector)?;
    validate_detection(&detection, values.len())?;

    let turning_points = detection
        .turning_points
        .iter()
        .zip(&detection.stats)
        .map(|(&tp, stats)| {
            let sample_index = sample_indices[tp];
            TurningPointMark {
                sample_index,
                date: epochs[sample_index],
                value: values[tp],
                stats: *stats,
            }
        })
        .collect::<Vec<_>>();

    let filtered_api = filter_near_dates(api_monthly, &epochs, config.align.threshold_days)?;
    let high_api_months = filtered_api
        .iter()
        .filter_map(|p| p.present_value())
        .filter(|v| *v >= config.align.display_threshold)
        .count();

    let (xs, ys) = pair_with_nearest_epoch(&filtered_api, &epochs, &point.values)?;
    let correlation = pearson(&xs, &ys)?;

    info!(
        "Point {}: {} turning points, {} aligned API months",
        id,
        turning_points.len(),
        filtered_api.len()
    );

    Ok(PointAnalysis {
        id: point.id.clone(),
        epochs,
        values: point.values.clone(),
        turning_points,
        trend: detection.trend,
        sample_indices,
        filtered_api,
        high_api_months,
        correlation,
    })
}

fn validate_detection(detection: &Detection, sample_count: usize) -> Result<()> {
    if detection.stats.len() != detection.turning_points.len() {
        return Err(ProcessorError::invalid_input(format!(
            "detector returned {} turning points but {} stats entries",
            detection.turning_points.len(),
            detection.stats.len()
        )));
    }

    if let Some(&bad) = detection.turning_points.iter().find(|&&tp| tp >= sample_count) {
        return Err(ProcessorError::invalid_input(format!(
            "turning point position {} is outside a series of {} samples",
            bad, sample_count
        )));
    }

    if !detection.trend.is_empty() && detection.trend.len() != sample_count {
        return Err(ProcessorError::invalid_input(format!(
            "trend has {} values for {} samples",
            detection.trend.len(),
            sample_count
        )));
    }

    Ok(())
}
