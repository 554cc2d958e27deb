//! API Processor Library
//!
//! Derives an antecedent precipitation index (API) from a daily rainfall
//! record and relates it to InSAR ground-deformation time series.
//!
//! This library provides tools for:
//! - Cleaning dated series and computing the recursive decay index
//! - Calendar-month resampling onto a zero-based decimal-year axis
//! - Aligning the monthly index with deformation survey epochs
//! - Negotiating date formats for turning-point tables
//! - Direction histograms and per-month turning-point counts
//! - Flat-file loading and CSV output through polars

pub mod align;
pub mod binning;
pub mod cli;
pub mod config;
pub mod constants;
pub mod date_parser;
pub mod decay;
pub mod deformation;
pub mod detector;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod resample;
pub mod series;
pub mod writer;

// Re-export commonly used types
pub use align::{filter_near_dates, pearson};
pub use binning::{DirectionHistogram, bin_directions};
pub use config::ProcessorConfig;
pub use date_parser::MultiFormatDateParser;
pub use decay::antecedent_precipitation_index;
pub use detector::{Detection, TurningPointDetector, analyze_point};
pub use error::{ProcessorError, Result};
pub use models::{DecimalYear, IndexPoint, MonthlyMean, TimePoint, YearMonth};
pub use resample::{decimal_year_axis, monthly_mean};
pub use series::clean_series;
