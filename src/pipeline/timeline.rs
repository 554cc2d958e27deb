//! Monthly turning-point counts for descending and ascending orbits.

use crate::config::HistogramConfig;
use crate::error::Result;
use crate::loader::{TurningPointDates, ensure_exists, load_turning_point_dates};
use crate::models::{MonthCount, Orbit, ProcessingStats, TurningPointRecord, YearMonth};
use crate::writer::write_turning_point_timeline;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Month with the highest count and that count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakMonth {
    pub month: YearMonth,
    pub count: usize,
}

#[derive(Debug)]
pub struct TimelineReport {
    pub stats: ProcessingStats,
    pub rows: Vec<MonthCount>,
    pub descending_peak: Option<PeakMonth>,
    pub ascending_peak: Option<PeakMonth>,
    pub total_peak: Option<PeakMonth>,
    pub descending_format: Option<String>,
    pub ascending_format: Option<String>,
    /// Records whose date could not be parsed, both orbits
    pub unparsed_dates: usize,
}

/// Count dated records per month for both orbits. Records without an id
/// are not counted. Every month occupied by either orbit appears once, in
/// ascending order; the other orbit's count is zero there.
pub fn count_by_month(
    descending: &[TurningPointRecord],
    ascending: &[TurningPointRecord],
) -> Vec<MonthCount> {
    let mut counts: BTreeMap<YearMonth, MonthCount> = BTreeMap::new();

    for (orbit, records) in [(Orbit::Descending, descending), (Orbit::Ascending, ascending)] {
        let counted = records
            .iter()
            .filter(|r| !r.id.trim().is_empty())
            .filter_map(|r| r.date);
        for month in counted {
            let entry = counts.entry(month).or_insert(MonthCount {
                month,
                descending: 0,
                ascending: 0,
            });
            match orbit {
                Orbit::Descending => entry.descending += 1,
                Orbit::Ascending => entry.ascending += 1,
            }
        }
    }

    counts.into_values().collect()
}

/// Earliest month holding the largest value of `count`; `None` when every
/// count is zero
pub fn peak_month<F>(rows: &[MonthCount], count: F) -> Option<PeakMonth>
where
    F: Fn(&MonthCount) -> usize,
{
    let mut peak: Option<PeakMonth> = None;
    for row in rows {
        let value = count(row);
        if value > peak.map_or(0, |p| p.count) {
            peak = Some(PeakMonth {
                month: row.month,
                count: value,
            });
        }
    }
    peak
}

pub struct TimelineProcessor {
    descending_path: PathBuf,
    ascending_path: PathBuf,
    output_path: PathBuf,
    config: HistogramConfig,
}

impl TimelineProcessor {
    pub fn new(descending_path: PathBuf, ascending_path: PathBuf, output_path: PathBuf) -> Result<Self> {
        ensure_exists(&descending_path)?;
        ensure_exists(&ascending_path)?;

        Ok(Self {
            descending_path,
            ascending_path,
            output_path,
            config: HistogramConfig::default(),
        })
    }

    pub fn with_config(mut self, config: HistogramConfig) -> Self {
        self.config = config;
        self
    }

    pub fn process(&self) -> Result<TimelineReport> {
        let start_time = Instant::now();

        let descending = self.load(&self.descending_path, Orbit::Descending)?;
        let ascending = self.load(&self.ascending_path, Orbit::Ascending)?;

        let rows = count_by_month(&descending.records, &ascending.records);
        let rows_written = write_turning_point_timeline(&self.output_path, &rows)?;

        let descending_peak = peak_month(&rows, |r| r.count(Orbit::Descending));
        let ascending_peak = peak_month(&rows, |r| r.count(Orbit::Ascending));
        let total_peak = peak_month(&rows, MonthCount::total);
        let unparsed_dates = descending.unparsed_dates + ascending.unparsed_dates;

        info!(
            "Counted turning points over {} months, peak {:?}",
            rows.len(),
            total_peak.map(|p| p.month.to_string())
        );

        Ok(TimelineReport {
            stats: ProcessingStats {
                rows_read: descending.records.len() + ascending.records.len(),
                rows_dropped: unparsed_dates,
                rows_written,
                output_path: self.output_path.clone(),
                processing_time_ms: start_time.elapsed().as_millis(),
            },
            rows,
            descending_peak,
            ascending_peak,
            total_peak,
            descending_format: descending.date_format,
            ascending_format: ascending.date_format,
            unparsed_dates,
        })
    }

    fn load(&self, path: &std::path::Path, orbit: Orbit) -> Result<TurningPointDates> {
        let loaded = load_turning_point_dates(path, &self.config)?;
        if loaded.unparsed_dates > 0 {
            warn!(
                "{} orbit: {} dates could not be parsed",
                orbit, loaded.unparsed_dates
            );
        }
        debug!(
            "{} orbit: {} records using {:?}",
            orbit,
            loaded.records.len(),
            loaded.date_format
        );
        Ok(loaded)
    }
}
