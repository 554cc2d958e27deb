//! Command-line argument definitions for the API processor
//!
//! One subcommand per workflow. Options given on the command line override
//! the values loaded from `--config`.

use crate::config::ProcessorConfig;
use crate::models::YearMonth;
use crate::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the antecedent precipitation index processor
///
/// Derives a monthly antecedent precipitation index from daily rainfall,
/// resamples InSAR deformation tables to calendar months, aligns the two,
/// and summarises detected turning points.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "api-processor",
    version,
    about = "Antecedent precipitation index and deformation alignment workflows",
    long_about = "Derives a monthly antecedent precipitation index from a daily rainfall record, \
                  resamples wide InSAR deformation tables to calendar months on a decimal-year \
                  axis, aligns the index with survey epochs, and summarises detected turning \
                  points by direction and by month."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    ///
    /// TOML file with optional [index], [align], [detector], [histogram]
    /// and [resample] sections. Missing keys keep their defaults.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available workflows
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Compute the monthly antecedent precipitation index
    Index(IndexArgs),
    /// Resample a wide deformation table to calendar months
    Resample(ResampleArgs),
    /// Align the monthly index with deformation survey epochs
    Align(AlignArgs),
    /// Count turning-point directions per bucket
    Directions(DirectionsArgs),
    /// Count turning points per month for both orbits
    Histogram(HistogramArgs),
    /// Correlate station precipitation with a reference index
    Correlate(CorrelateArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct IndexArgs {
    /// Whitespace-delimited daily record: `dd/mm/yyyy value`
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input_path: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "API_Monthly.csv"
    )]
    pub output_path: PathBuf,

    /// Also write the daily index with high-day flags
    #[arg(long = "daily", value_name = "PATH")]
    pub daily_path: Option<PathBuf>,

    /// Decay constant k in [0, 1]
    #[arg(short = 'k', long = "decay", value_name = "K")]
    pub decay: Option<f64>,

    /// First day of the analysis window (YYYY-MM-DD)
    #[arg(long = "start", value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last day of the analysis window (YYYY-MM-DD)
    #[arg(long = "end", value_name = "DATE")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Parser)]
pub struct ResampleArgs {
    /// Wide table with D<YYYYMMDD> time columns
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input_path: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "resampled.csv"
    )]
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Parser)]
pub struct AlignArgs {
    /// Monthly index table (Date,API)
    #[arg(long = "api", value_name = "PATH")]
    pub api_path: PathBuf,

    /// Resampled deformation table
    #[arg(long = "deformation", value_name = "PATH")]
    pub deformation_path: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "API_Filtered.csv"
    )]
    pub output_path: PathBuf,

    /// Measurement point to compare with the aligned index
    #[arg(long = "id", value_name = "ID")]
    pub point_id: Option<String>,

    /// Write the selected point's series here
    #[arg(long = "point-output", value_name = "PATH", requires = "point_id")]
    pub point_output: Option<PathBuf>,

    /// Maximum distance in days to the nearest survey epoch
    #[arg(long = "threshold-days", value_name = "DAYS")]
    pub threshold_days: Option<u32>,

    /// Month of the first survey epoch (YYYY-MM)
    #[arg(long = "survey-start", value_name = "YYYY-MM", value_parser = parse_year_month)]
    pub survey_start: Option<YearMonth>,
}

#[derive(Debug, Clone, Parser)]
pub struct DirectionsArgs {
    /// Turning-point table with Direction and Slope columns
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input_path: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "direction_histogram.csv"
    )]
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Parser)]
pub struct HistogramArgs {
    /// Turning points detected on the descending orbit
    #[arg(long = "descending", value_name = "PATH")]
    pub descending_path: PathBuf,

    /// Turning points detected on the ascending orbit
    #[arg(long = "ascending", value_name = "PATH")]
    pub ascending_path: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "turning_point_timeline.csv"
    )]
    pub output_path: PathBuf,

    /// Candidate date formats, tried in order (comma-separated)
    #[arg(long = "date-formats", value_name = "LIST", value_delimiter = ',')]
    pub date_formats: Option<Vec<String>>,
}

#[derive(Debug, Clone, Parser)]
pub struct CorrelateArgs {
    /// Whitespace-delimited daily record: `dd/mm/yyyy value`
    #[arg(long = "precipitation", value_name = "PATH")]
    pub precipitation_path: PathBuf,

    /// Headerless reference index: `date,mean_precipitation`
    #[arg(long = "reference", value_name = "PATH")]
    pub reference_path: PathBuf,
}

/// Parse `YYYY-MM` into a month code
pub fn parse_year_month(text: &str) -> std::result::Result<YearMonth, String> {
    let (year, month) = text
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{}'", text))?;
    let year: i32 = year
        .parse()
        .map_err(|_| format!("invalid year in '{}'", text))?;
    let month: u32 = month
        .parse()
        .map_err(|_| format!("invalid month in '{}'", text))?;
    YearMonth::new(year, month).ok_or_else(|| format!("'{}' is not a valid calendar month", text))
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Configuration from `--config` (or defaults) with command-line
    /// overrides applied, validated
    pub fn resolve_config(&self) -> Result<ProcessorConfig> {
        let config = match &self.config_file {
            Some(path) => ProcessorConfig::from_file(path)?,
            None => ProcessorConfig::default(),
        };

        let config = self.apply_overrides(config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, mut config: ProcessorConfig) -> ProcessorConfig {
        match &self.command {
            Commands::Index(args) => {
                if let Some(decay) = args.decay {
                    config = config.with_decay(decay);
                }
                let start = args.start.unwrap_or(config.index.window_start);
                let end = args.end.unwrap_or(config.index.window_end);
                config = config.with_window(start, end);
            }
            Commands::Align(args) => {
                if let Some(days) = args.threshold_days {
                    config = config.with_threshold_days(days);
                }
                if let Some(start) = args.survey_start {
                    config = config.with_survey_start(start);
                }
            }
            Commands::Histogram(args) => {
                if let Some(formats) = &args.date_formats {
                    config = config.with_date_formats(formats.clone());
                }
            }
            Commands::Resample(_) | Commands::Directions(_) | Commands::Correlate(_) => {}
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_month() {
        assert_eq!(parse_year_month("2011-05"), Ok(YearMonth { year: 2011, month: 5 }));
        assert!(parse_year_month("2011-13").is_err());
        assert!(parse_year_month("201105").is_err());
    }

    #[test]
    fn test_log_level() {
        let args = Args::try_parse_from(["api-processor", "-vv", "resample", "-i", "ts.csv"]).unwrap();
        assert_eq!(args.get_log_level(), "debug");

        let args = Args::try_parse_from(["api-processor", "resample", "-i", "ts.csv", "-q"]).unwrap();
        assert_eq!(args.get_log_level(), "error");

        assert!(Args::try_parse_from(["api-processor", "-q", "-v", "resample", "-i", "x"]).is_err());
    }

    #[test]
    fn test_index_overrides() {
        let args = Args::try_parse_from([
            "api-processor",
            "index",
            "-i",
            "Pdata.txt",
            "--decay",
            "0.5",
            "--start",
            "2015-01-01",
        ])
        .unwrap();

        let config = args.resolve_config().unwrap();
        assert_eq!(config.index.decay, 0.5);
        assert_eq!(
            config.index.window_start,
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
        assert_eq!(
            config.index.window_end,
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap()
        );

        match args.command {
            Commands::Index(index) => {
                assert_eq!(index.output_path, PathBuf::from("API_Monthly.csv"));
                assert!(index.daily_path.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = Args::try_parse_from(["api-processor", "index", "-i", "Pdata.txt", "-k", "2.0"]).unwrap();
        assert!(args.resolve_config().is_err());
    }

    #[test]
    fn test_align_and_histogram_overrides() {
        let args = Args::try_parse_from([
            "api-processor",
            "align",
            "--api",
            "api.csv",
            "--deformation",
            "resampled.csv",
            "--threshold-days",
            "15",
            "--survey-start",
            "2014-10",
        ])
        .unwrap();
        let config = args.resolve_config().unwrap();
        assert_eq!(config.align.threshold_days, 15);
        assert_eq!(config.align.survey_start, YearMonth { year: 2014, month: 10 });

        let args = Args::try_parse_from([
            "api-processor",
            "histogram",
            "--descending",
            "d.csv",
            "--ascending",
            "a.csv",
            "--date-formats",
            "%b-%y,%Y-%m",
        ])
        .unwrap();
        let config = args.resolve_config().unwrap();
        assert_eq!(config.histogram.date_formats, vec!["%b-%y", "%Y-%m"]);
    }

    #[test]
    fn test_point_output_requires_id() {
        let result = Args::try_parse_from([
            "api-processor",
            "align",
            "--api",
            "api.csv",
            "--deformation",
            "resampled.csv",
            "--point-output",
            "p.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let args = Args::try_parse_from([
            "api-processor",
            "--config",
            "/no/such/config.toml",
            "resample",
            "-i",
            "ts.csv",
        ])
        .unwrap();
        assert!(matches!(
            args.resolve_config(),
            Err(crate::ProcessorError::MissingResource { .. })
        ));
    }
}
