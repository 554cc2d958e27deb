//! Direction histogram and turning-point timeline workflow tests

use super::write_fixture;
use crate::error::ProcessorError;
use crate::models::{MonthCount, TurningPointRecord, YearMonth};
use crate::pipeline::timeline::{PeakMonth, count_by_month, peak_month};
use crate::pipeline::{DirectionHistogramProcessor, TimelineProcessor};
use std::fs;
use tempfile::TempDir;

fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

#[test]
fn test_direction_histogram_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(
        &temp_dir,
        "filtered_turning_points.csv",
        "ID,Date (mm/yyyy),Direction,Slope
A,21-Jan,-10.0,-0.5
B,21-Feb,-9.0,0.2
C,21-Mar,0.0,-1.0
D,21-Apr,10.0,0.0
E,21-May,,1.0
",
    );
    let output = temp_dir.path().join("direction_histogram.csv");

    let report = DirectionHistogramProcessor::new(input, output.clone())
        .unwrap()
        .process()
        .unwrap();

    assert_eq!(report.stats.rows_read, 5);
    assert_eq!(report.histogram.total(), 4);
    assert_eq!(report.histogram.unbinned, 1);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 12);
    assert_eq!(lines[2], "[-10 -8),2,1,1");
    assert_eq!(lines[6], "[-2 2),1,0,1");
    assert_eq!(lines[11], "> 10,1,1,0");
}

#[test]
fn test_direction_histogram_requires_direction_column() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir, "tp.csv", "ID,Date (mm/yyyy)\nA,21-Jan\n");

    let err = DirectionHistogramProcessor::new(input, temp_dir.path().join("out.csv"))
        .unwrap()
        .process()
        .unwrap_err();
    assert!(matches!(err, ProcessorError::InvalidTable { .. }));
}

#[test]
fn test_timeline_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let descending = write_fixture(
        &temp_dir,
        "descending.csv",
        "ID,Date (mm/yyyy),Direction,Slope
A,19-Dec,1.0,1.0
B,20-Jan,1.0,1.0
C,20-Jan,1.0,1.0
D,garbled,1.0,1.0
",
    );
    // Second orbit uses the month-first layout
    let ascending = write_fixture(
        &temp_dir,
        "ascending.csv",
        "ID,Date (mm/yyyy),Direction,Slope
E,Jan-20,1.0,1.0
F,Feb-20,1.0,1.0
G,Feb-20,1.0,1.0
H,Feb-20,1.0,1.0
",
    );
    let output = temp_dir.path().join("timeline.csv");

    let report = TimelineProcessor::new(descending, ascending, output.clone())
        .unwrap()
        .process()
        .unwrap();

    assert_eq!(report.descending_format.as_deref(), Some("%y-%b"));
    assert_eq!(report.ascending_format.as_deref(), Some("%b-%y"));
    assert_eq!(report.unparsed_dates, 1);

    assert_eq!(
        report.descending_peak,
        Some(PeakMonth {
            month: ym(2020, 1),
            count: 2
        })
    );
    assert_eq!(
        report.ascending_peak,
        Some(PeakMonth {
            month: ym(2020, 2),
            count: 3
        })
    );
    // January and February tie on 3; the earlier month wins
    assert_eq!(
        report.total_peak,
        Some(PeakMonth {
            month: ym(2020, 1),
            count: 3
        })
    );

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(
        text,
        "Date,Descending,Ascending,Total\n2019-12,1,0,1\n2020-01,2,1,3\n2020-02,0,3,3\n"
    );
}

#[test]
fn test_timeline_rejects_unreadable_dates() {
    let temp_dir = TempDir::new().unwrap();
    let descending = write_fixture(&temp_dir, "d.csv", "ID,Date (mm/yyyy)\nA,sometime\n");
    let ascending = write_fixture(&temp_dir, "a.csv", "ID,Date (mm/yyyy)\nB,20-Jan\n");

    let err = TimelineProcessor::new(descending, ascending, temp_dir.path().join("out.csv"))
        .unwrap()
        .process()
        .unwrap_err();
    assert!(matches!(err, ProcessorError::NoMatchingFormat { .. }));
}

#[test]
fn test_peak_month_ignores_empty_orbits() {
    let rows = vec![MonthCount {
        month: ym(2020, 1),
        descending: 0,
        ascending: 2,
    }];
    assert_eq!(peak_month(&rows, |r| r.descending), None);
    assert_eq!(peak_month(&[], MonthCount::total), None);
    assert!(count_by_month(&[], &[]).is_empty());
}

#[test]
fn test_records_without_id_are_not_counted() {
    let record = |id: &str, month: YearMonth| TurningPointRecord {
        id: id.to_string(),
        direction: None,
        slope: None,
        date: Some(month),
    };
    let descending = vec![record("A", ym(2020, 1)), record("", ym(2020, 1))];
    let ascending = vec![record("  ", ym(2020, 2))];

    let rows = count_by_month(&descending, &ascending);
    assert_eq!(
        rows,
        vec![MonthCount {
            month: ym(2020, 1),
            descending: 1,
            ascending: 0,
        }]
    );
}

#[test]
fn test_timeline_skips_blank_ids() {
    let temp_dir = TempDir::new().unwrap();
    let descending = write_fixture(
        &temp_dir,
        "d.csv",
        "ID,Date (mm/yyyy)\nA,20-Jan\n,20-Jan\nB,20-Feb\n",
    );
    let ascending = write_fixture(&temp_dir, "a.csv", "ID,Date (mm/yyyy)\nC,20-Feb\n");
    let output = temp_dir.path().join("out.csv");

    TimelineProcessor::new(descending, ascending, output.clone())
        .unwrap()
        .process()
        .unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(
        text,
        "Date,Descending,Ascending,Total\n2020-01,1,0,1\n2020-02,1,1,2\n"
    );
}
