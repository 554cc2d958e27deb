//! Station precipitation compared with a gridded reference index.

use crate::align::pearson;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::loader::{ensure_exists, load_precipitation, load_reference_index};
use crate::models::{MonthlyMean, TimePoint, YearMonth};
use crate::resample::monthly_mean;
use crate::series::clean_series;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A month present in both series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthPair {
    pub month: YearMonth,
    pub station: f64,
    pub reference: f64,
}

#[derive(Debug)]
pub struct CorrelationReport {
    pub station_months: usize,
    pub reference_months: usize,
    pub pairs: Vec<MonthPair>,
    /// Absent with fewer than two pairs or a constant series
    pub coefficient: Option<f64>,
}

/// Inner join of monthly station means with reference values on calendar
/// month. Absent reference values are skipped; for a month repeated in the
/// reference the first present value is used.
pub fn join_on_month(station: &[MonthlyMean], reference: &[TimePoint]) -> Vec<MonthPair> {
    let mut by_month: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for point in reference {
        if let Some(value) = point.present_value() {
            by_month.entry(YearMonth::of(point.date)).or_insert(value);
        }
    }

    station
        .iter()
        .filter_map(|m| {
            by_month.get(&m.month).map(|reference| MonthPair {
                month: m.month,
                station: m.mean,
                reference: *reference,
            })
        })
        .collect()
}

pub struct CorrelationProcessor {
    precipitation_path: PathBuf,
    reference_path: PathBuf,
    config: IndexConfig,
}

impl CorrelationProcessor {
    pub fn new(precipitation_path: PathBuf, reference_path: PathBuf) -> Result<Self> {
        ensure_exists(&precipitation_path)?;
        ensure_exists(&reference_path)?;

        Ok(Self {
            precipitation_path,
            reference_path,
            config: IndexConfig::default(),
        })
    }

    /// Only the analysis window of the index configuration is used
    pub fn with_config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn process(&self) -> Result<CorrelationReport> {
        let precipitation = load_precipitation(&self.precipitation_path)?;
        let cleaned = clean_series(
            &precipitation.rows,
            self.config.window_start,
            self.config.window_end,
        );
        let station = monthly_mean(&cleaned.points);

        let reference = load_reference_index(&self.reference_path)?;
        let pairs = join_on_month(&station, &reference.rows);
        debug!(
            "{} station months, {} reference rows, {} joined",
            station.len(),
            reference.rows.len(),
            pairs.len()
        );

        let xs: Vec<f64> = pairs.iter().map(|p| p.station).collect();
        let ys: Vec<f64> = pairs.iter().map(|p| p.reference).collect();
        let coefficient = pearson(&xs, &ys)?;

        match coefficient {
            Some(r) => info!("Pearson correlation over {} months: {:.4}", pairs.len(), r),
            None => warn!(
                "Correlation undefined over {} joined months",
                pairs.len()
            ),
        }

        Ok(CorrelationReport {
            station_months: station.len(),
            reference_months: reference.rows.len(),
            pairs,
            coefficient,
        })
    }
}
