//! Calendar-aware resampling.
//!
//! Groups dated observations by calendar month (year + month, not fixed
//! 30-day windows) and maps month codes onto a zero-based decimal-year axis.

use crate::models::{DecimalYear, MonthlyMean, TimePoint, YearMonth};
use std::collections::BTreeMap;
use tracing::debug;

/// Mean of all present values per calendar month, in ascending month order.
///
/// Months without any present value do not appear in the output. Input
/// order does not matter.
pub fn monthly_mean(points: &[TimePoint]) -> Vec<MonthlyMean> {
    let mut buckets: BTreeMap<YearMonth, (f64, usize)> = BTreeMap::new();

    for point in points {
        if let Some(value) = point.present_value() {
            let bucket = buckets.entry(YearMonth::of(point.date)).or_insert((0.0, 0));
            bucket.0 += value;
            bucket.1 += 1;
        }
    }

    let result: Vec<MonthlyMean> = buckets
        .into_iter()
        .map(|(month, (sum, count))| MonthlyMean {
            month,
            mean: sum / count as f64,
            count,
        })
        .collect();

    debug!(
        "Resampled {} points into {} monthly means",
        points.len(),
        result.len()
    );

    result
}

/// Zero-based decimal years for a monthly aggregate, anchored on its first
/// element: `(year - year0) + (month - month0) / 12`.
pub fn decimal_year_axis(aggregate: &[MonthlyMean]) -> Vec<DecimalYear> {
    decimal_years(aggregate.iter().map(|m| m.month))
}

/// Decimal-year offsets for an ordered sequence of month codes, anchored on
/// the first code yielded.
pub fn decimal_years<I>(months: I) -> Vec<DecimalYear>
where
    I: IntoIterator<Item = YearMonth>,
{
    let mut months = months.into_iter().peekable();
    let Some(&anchor) = months.peek() else {
        return Vec::new();
    };

    months
        .map(|month| DecimalYear {
            month,
            offset: (month.year - anchor.year) as f64
                + (month.month as f64 - anchor.month as f64) / 12.0,
        })
        .collect()
}

/// Render a decimal-year offset as a column header, always with a
/// fractional part (`0.0`, `0.08333333333333333`, `1.0`).
pub fn format_decimal_year(offset: f64) -> String {
    let text = offset.to_string();
    if text.contains('.') || text.contains('e') || !offset.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(y: i32, m: u32, d: u32, v: f64) -> TimePoint {
        TimePoint::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), v)
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_mean_of_two_points_in_month() {
        let result = monthly_mean(&[point(2011, 5, 3, 5.0), point(2011, 5, 20, 7.0)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].month, ym(2011, 5));
        assert_eq!(result[0].mean, 6.0);
        assert_eq!(result[0].count, 2);
    }

    #[test]
    fn test_empty_months_are_absent() {
        let result = monthly_mean(&[point(2011, 1, 31, 2.0), point(2011, 3, 1, 4.0)]);
        let months: Vec<_> = result.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![ym(2011, 1), ym(2011, 3)]);
    }

    #[test]
    fn test_bucket_is_calendar_month() {
        // Jan 31 and Feb 1 are one day apart but fall in different months
        let result = monthly_mean(&[point(2012, 1, 31, 1.0), point(2012, 2, 1, 3.0)]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].mean, 1.0);
        assert_eq!(result[1].mean, 3.0);
    }

    #[test]
    fn test_absent_values_are_skipped() {
        let date = NaiveDate::from_ymd_opt(2011, 6, 1).unwrap();
        let result = monthly_mean(&[
            TimePoint::absent(date),
            point(2011, 6, 2, 4.0),
            TimePoint::new(date, f64::NAN),
            TimePoint::absent(NaiveDate::from_ymd_opt(2011, 7, 1).unwrap()),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].mean, 4.0);
        assert_eq!(result[0].count, 1);
    }

    #[test]
    fn test_output_is_sorted_regardless_of_input_order() {
        let result = monthly_mean(&[point(2013, 2, 1, 1.0), point(2012, 12, 1, 2.0)]);
        assert_eq!(result[0].month, ym(2012, 12));
        assert_eq!(result[1].month, ym(2013, 2));
    }

    #[test]
    fn test_empty_input() {
        assert!(monthly_mean(&[]).is_empty());
        assert!(decimal_year_axis(&[]).is_empty());
    }

    #[test]
    fn test_decimal_year_thirteen_months() {
        let months: Vec<YearMonth> = (0..13).map(|i| ym(2011, 5).add_months(i).unwrap()).collect();
        let axis = decimal_years(months.clone());

        assert_eq!(axis.len(), 13);
        for (i, entry) in axis.iter().enumerate() {
            assert_eq!(entry.month, months[i]);
            assert!((entry.offset - i as f64 / 12.0).abs() < 1e-12);
        }
        assert_eq!(axis[0].offset, 0.0);
        assert_eq!(axis[12].offset, 1.0);
    }

    #[test]
    fn test_decimal_year_uses_calendar_distance_not_index() {
        let aggregate = monthly_mean(&[point(2011, 5, 1, 1.0), point(2011, 8, 1, 1.0)]);
        let axis = decimal_year_axis(&aggregate);
        assert_eq!(axis[0].offset, 0.0);
        assert!((axis[1].offset - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_decimal_year_anchors_on_truncated_series() {
        let aggregate = monthly_mean(&[point(2014, 3, 1, 1.0), point(2015, 1, 1, 1.0)]);
        let axis = decimal_year_axis(&aggregate[1..]);
        assert_eq!(axis[0].offset, 0.0);
    }

    #[test]
    fn test_format_decimal_year() {
        assert_eq!(format_decimal_year(0.0), "0.0");
        assert_eq!(format_decimal_year(1.0), "1.0");
        assert_eq!(format_decimal_year(0.25), "0.25");
        assert_eq!(format_decimal_year(1.0 / 12.0), (1.0f64 / 12.0).to_string());
    }
}
