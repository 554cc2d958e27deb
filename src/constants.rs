//! Application constants for the API processor
//!
//! Default parameter values, column names and histogram bucket edges used
//! throughout the workflows. Runtime code reads these through
//! [`crate::config::ProcessorConfig`] rather than directly.

// =============================================================================
// Antecedent Precipitation Index Defaults
// =============================================================================

/// Default decay constant `k` of the index recurrence
pub const DEFAULT_DECAY: f64 = 0.85;

/// Daily index level above which a day counts as a high-API day (mm)
pub const DEFAULT_DAILY_HIGH_THRESHOLD: f64 = 100.0;

/// Monthly mean index level at or above which a month is a high spell (mm)
pub const DEFAULT_MONTHLY_HIGH_THRESHOLD: f64 = 90.0;

/// Index level marked on aligned deformation/API comparisons (mm)
pub const DEFAULT_DISPLAY_THRESHOLD: f64 = 80.0;

/// Default analysis window, inclusive (year, month, day)
pub const DEFAULT_WINDOW_START: (i32, u32, u32) = (2011, 1, 1);
pub const DEFAULT_WINDOW_END: (i32, u32, u32) = (2022, 12, 31);

// =============================================================================
// Alignment Defaults
// =============================================================================

/// Maximum distance in days between an API month and a survey epoch
pub const DEFAULT_ALIGN_THRESHOLD_DAYS: u32 = 30;

/// First month of the deformation survey (year, month)
pub const DEFAULT_SURVEY_START: (i32, u32) = (2011, 5);

/// Largest magnitude accepted for a decimal-year time header. Keeps every
/// survey epoch within the range of a calendar date.
pub const MAX_DECIMAL_YEAR: f64 = 200_000.0;

// =============================================================================
// Turning Point Detector Defaults
// =============================================================================

pub mod detector {
    pub const WINDOW_SIZE: usize = 60;
    pub const STEP: usize = 12;
    pub const SNR: f64 = 1.0;
    pub const NDRI: f64 = 0.3;
    pub const DIRECTION_THRESHOLD: f64 = 0.0;
    pub const TURNING_POINT_THRESHOLD: f64 = 1.0;
    pub const MARGIN: usize = 12;
    pub const ALPHA: f64 = 0.01;
}

// =============================================================================
// File Formats
// =============================================================================

/// Date format of the daily precipitation record
pub const PRECIPITATION_DATE_FORMAT: &str = "%d/%m/%Y";

/// Date format used for every date written by this tool
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted date formats when reading an API monthly table back in
pub const API_TABLE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Candidate formats for turning-point dates, tried in order
pub const TURNING_POINT_DATE_FORMATS: &[&str] = &["%y-%b", "%b-%y"];

/// Candidate formats for reference index (GPM) dates, tried in order
pub const REFERENCE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y-%m",
];

/// Prefix and full format of wide-table time-series column names
pub const TIME_COLUMN_PREFIX: &str = "D";
pub const TIME_COLUMN_FORMAT: &str = "D%Y%m%d";

/// Number of identifier columns (id, latitude, longitude) before the time axis
pub const LEADING_COLUMNS: usize = 3;

/// Years below this are shifted forward one century after parsing
pub const CENTURY_PIVOT_YEAR: i32 = 2000;

// =============================================================================
// Column Name Constants
// =============================================================================

pub mod columns {
    pub const DATE: &str = "Date";
    pub const API: &str = "API";
    pub const PRECIPITATION: &str = "Precipitation";
    pub const HIGH_API: &str = "High_API";
    pub const DEFORMATION: &str = "Deformation";

    // Turning-point tables
    pub const TP_ID: &str = "ID";
    pub const TP_DATE: &str = "Date (mm/yyyy)";
    pub const TP_DIRECTION: &str = "Direction";
    pub const TP_SLOPE: &str = "Slope";

    // Histogram outputs
    pub const BIN: &str = "Bin";
    pub const TOTAL: &str = "Total";
    pub const POSITIVE: &str = "Positive";
    pub const NEGATIVE: &str = "Negative";
    pub const DESCENDING: &str = "Descending";
    pub const ASCENDING: &str = "Ascending";
}

// =============================================================================
// Direction Histogram
// =============================================================================

/// Interior bucket edges for turning-point directions (mm/year).
/// Buckets are left-closed, right-open: `[edge_i, edge_i+1)`, plus the two
/// unbounded outer buckets.
pub const DIRECTION_EDGES: &[f64] = &[-10.0, -8.0, -6.0, -4.0, -2.0, 2.0, 4.0, 6.0, 8.0, 10.0];

/// Labels of the direction buckets, lowest first
pub const DIRECTION_LABELS: &[&str] = &[
    "< -10", "[-10 -8)", "[-8 -6)", "[-6 -4)", "[-4 -2)", "[-2 2)", "[2 4)", "[4 6)", "[6 8)",
    "[8 10)", "> 10",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_labels_match_edges() {
        assert_eq!(DIRECTION_LABELS.len(), DIRECTION_EDGES.len() + 1);
        assert!(DIRECTION_EDGES.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_default_window_is_ordered() {
        assert!(DEFAULT_WINDOW_START < DEFAULT_WINDOW_END);
    }
}
