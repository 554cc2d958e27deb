//! Configuration management and validation.
//!
//! Every tunable constant of the workflows (decay constant, the three
//! independent API thresholds, alignment distance, detector parameters,
//! candidate date formats) lives in [`ProcessorConfig`] and is passed
//! explicitly into each component call.

use crate::constants::{self, detector};
use crate::error::{ProcessorError, Result};
use crate::models::YearMonth;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Parameters of the antecedent precipitation index workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Recurrence weight `k` of the previous index value
    pub decay: f64,

    /// Daily index strictly above this marks a high-API day
    pub daily_high_threshold: f64,

    /// Monthly mean at or above this marks a high spell
    pub monthly_high_threshold: f64,

    /// First date kept from the precipitation record (inclusive)
    pub window_start: NaiveDate,

    /// Last date kept from the precipitation record (inclusive)
    pub window_end: NaiveDate,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let (sy, sm, sd) = constants::DEFAULT_WINDOW_START;
        let (ey, em, ed) = constants::DEFAULT_WINDOW_END;
        Self {
            decay: constants::DEFAULT_DECAY,
            daily_high_threshold: constants::DEFAULT_DAILY_HIGH_THRESHOLD,
            monthly_high_threshold: constants::DEFAULT_MONTHLY_HIGH_THRESHOLD,
            window_start: NaiveDate::from_ymd_opt(sy, sm, sd).unwrap_or(NaiveDate::MIN),
            window_end: NaiveDate::from_ymd_opt(ey, em, ed).unwrap_or(NaiveDate::MAX),
        }
    }
}

/// Parameters of the API / deformation survey alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Maximum distance in days to the nearest survey epoch
    pub threshold_days: u32,

    /// Month of the first deformation survey epoch (decimal year 0.0)
    pub survey_start: YearMonth,

    /// API level reported alongside a single point's deformation series
    pub display_threshold: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        let (year, month) = constants::DEFAULT_SURVEY_START;
        Self {
            threshold_days: constants::DEFAULT_ALIGN_THRESHOLD_DAYS,
            survey_start: YearMonth { year, month },
            display_threshold: constants::DEFAULT_DISPLAY_THRESHOLD,
        }
    }
}

/// Parameters handed through, uninterpreted, to the turning-point detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub window_size: usize,
    pub step: usize,
    pub snr: f64,
    pub ndri: f64,
    pub direction_threshold: f64,
    pub turning_point_threshold: f64,
    pub margin: usize,
    pub alpha: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: detector::WINDOW_SIZE,
            step: detector::STEP,
            snr: detector::SNR,
            ndri: detector::NDRI,
            direction_threshold: detector::DIRECTION_THRESHOLD,
            turning_point_threshold: detector::TURNING_POINT_THRESHOLD,
            margin: detector::MARGIN,
            alpha: detector::ALPHA,
        }
    }
}

/// Turning-point table layout and date negotiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Candidate date formats, tried in order
    pub date_formats: Vec<String>,
    pub id_column: String,
    pub date_column: String,
    pub direction_column: String,
    pub slope_column: String,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            date_formats: constants::TURNING_POINT_DATE_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            id_column: constants::columns::TP_ID.to_string(),
            date_column: constants::columns::TP_DATE.to_string(),
            direction_column: constants::columns::TP_DIRECTION.to_string(),
            slope_column: constants::columns::TP_SLOPE.to_string(),
        }
    }
}

/// Wide deformation table layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Columns starting with this prefix are treated as time samples
    pub time_column_prefix: String,

    /// chrono format that turns a time column name into a date
    pub time_column_format: String,

    /// Identifier columns preceding the decimal-year axis in resampled tables
    pub leading_columns: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            time_column_prefix: constants::TIME_COLUMN_PREFIX.to_string(),
            time_column_format: constants::TIME_COLUMN_FORMAT.to_string(),
            leading_columns: constants::LEADING_COLUMNS,
        }
    }
}

/// Global configuration for all workflows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub index: IndexConfig,
    pub align: AlignConfig,
    pub detector: DetectorConfig,
    pub histogram: HistogramConfig,
    pub resample: ResampleConfig,
}

impl ProcessorConfig {
    /// Load configuration from a TOML file. Sections and keys that are not
    /// present keep their defaults; dates are written as quoted strings.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProcessorError::MissingResource {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ProcessorError::configuration(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations no workflow can run with
    pub fn validate(&self) -> Result<()> {
        let decay = self.index.decay;
        if !decay.is_finite() || !(0.0..=1.0).contains(&decay) {
            return Err(ProcessorError::configuration(format!(
                "decay must lie in [0, 1], got {}",
                decay
            )));
        }

        if self.index.window_start > self.index.window_end {
            return Err(ProcessorError::configuration(format!(
                "window_start {} is after window_end {}",
                self.index.window_start, self.index.window_end
            )));
        }

        if YearMonth::new(self.align.survey_start.year, self.align.survey_start.month).is_none() {
            return Err(ProcessorError::configuration(format!(
                "survey_start {} is not a valid calendar month",
                self.align.survey_start
            )));
        }

        if self.histogram.date_formats.is_empty() {
            return Err(ProcessorError::configuration(
                "at least one turning-point date format is required",
            ));
        }

        if self.resample.time_column_prefix.is_empty() {
            return Err(ProcessorError::configuration(
                "time_column_prefix must not be empty",
            ));
        }

        Ok(())
    }

    /// Set the decay constant
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.index.decay = decay;
        self
    }

    /// Set the precipitation analysis window
    pub fn with_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.index.window_start = start;
        self.index.window_end = end;
        self
    }

    /// Set the alignment distance threshold
    pub fn with_threshold_days(mut self, days: u32) -> Self {
        self.align.threshold_days = days;
        self
    }

    /// Set the first survey month
    pub fn with_survey_start(mut self, start: YearMonth) -> Self {
        self.align.survey_start = start;
        self
    }

    /// Replace the candidate turning-point date formats
    pub fn with_date_formats(mut self, formats: Vec<String>) -> Self {
        self.histogram.date_formats = formats;
        self
    }
}
