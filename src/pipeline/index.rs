//! Daily precipitation record to monthly antecedent precipitation index.

use crate::config::IndexConfig;
use crate::decay::{antecedent_precipitation_index, index_as_series};
use crate::error::{ProcessorError, Result};
use crate::loader::{ensure_exists, load_precipitation};
use crate::models::{IndexPoint, MonthlyMean, ProcessingStats, YearMonth};
use crate::resample::monthly_mean;
use crate::series::clean_series;
use crate::writer::{write_api_daily, write_api_monthly};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of an index run
#[derive(Debug)]
pub struct IndexReport {
    pub stats: ProcessingStats,
    /// Daily observations that entered the recurrence
    pub observations: usize,
    /// Days with an index strictly above the daily threshold
    pub high_days: usize,
    /// Months whose mean index is at or above the monthly threshold
    pub high_months: Vec<YearMonth>,
    pub monthly: Vec<MonthlyMean>,
    pub peak: Option<IndexPoint>,
    pub daily_output: Option<PathBuf>,
}

/// Computes the index from a precipitation record and writes `Date,API`
pub struct IndexProcessor {
    input_path: PathBuf,
    output_path: PathBuf,
    daily_output: Option<PathBuf>,
    config: IndexConfig,
}

impl IndexProcessor {
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Result<Self> {
        ensure_exists(&input_path)?;

        Ok(Self {
            input_path,
            output_path,
            daily_output: None,
            config: IndexConfig::default(),
        })
    }

    pub fn with_config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    /// Also write the daily series with its high-day flags
    pub fn with_daily_output(mut self, path: PathBuf) -> Self {
        self.daily_output = Some(path);
        self
    }

    pub fn process(&self) -> Result<IndexReport> {
        let start_time = Instant::now();

        let loaded = load_precipitation(&self.input_path)?;
        let rows_read = loaded.rows.len() + loaded.dropped;

        let cleaned = clean_series(&loaded.rows, self.config.window_start, self.config.window_end);
        if cleaned.points.is_empty() {
            return Err(ProcessorError::invalid_input(format!(
                "no precipitation observations between {} and {} in {}",
                self.config.window_start,
                self.config.window_end,
                self.input_path.display()
            )));
        }
        debug!("{} observations after cleaning", cleaned.points.len());

        let index = antecedent_precipitation_index(
            &cleaned.points,
            self.config.decay,
            self.config.daily_high_threshold,
        )?;
        let monthly = monthly_mean(&index_as_series(&index));

        let rows_written = write_api_monthly(&self.output_path, &monthly)?;
        if let Some(daily_path) = &self.daily_output {
            write_api_daily(daily_path, &index)?;
        }

        let high_days = index.iter().filter(|p| p.is_high).count();
        let high_months: Vec<YearMonth> = monthly
            .iter()
            .filter(|m| m.mean >= self.config.monthly_high_threshold)
            .map(|m| m.month)
            .collect();
        let peak = index
            .iter()
            .copied()
            .reduce(|best, p| if p.value > best.value { p } else { best });

        if high_days == 0 {
            warn!(
                "No day exceeded the daily threshold of {}",
                self.config.daily_high_threshold
            );
        }
        info!(
            "Index written: {} months, {} high days, {} high months",
            monthly.len(),
            high_days,
            high_months.len()
        );

        Ok(IndexReport {
            stats: ProcessingStats {
                rows_read,
                rows_dropped: loaded.dropped + cleaned.dropped(),
                rows_written,
                output_path: self.output_path.clone(),
                processing_time_ms: start_time.elapsed().as_millis(),
            },
            observations: index.len(),
            high_days,
            high_months,
            monthly,
            peak,
            daily_output: self.daily_output.clone(),
        })
    }
}
