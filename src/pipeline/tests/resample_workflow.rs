//! Resample workflow tests

use super::write_fixture;
use crate::config::ResampleConfig;
use crate::error::ProcessorError;
use crate::loader::load_deformation_table;
use crate::pipeline::ResampleProcessor;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_resample_workflow_round_trips_through_loader() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(
        &temp_dir,
        "ts.csv",
        "ID,LAT,LON,D20110512,D20110524,D20110605\nP1,42.0,14.9,1.0,3.0,-2.0\nP2,42.1,15.0,10.0,,4.0\n",
    );
    let output = temp_dir.path().join("resampled.csv");

    let report = ResampleProcessor::new(input, output.clone())
        .unwrap()
        .process()
        .unwrap();

    assert_eq!(report.source_columns, 3);
    assert_eq!(report.axis.len(), 2);
    assert_eq!(report.stats.rows_read, 2);
    assert_eq!(report.stats.rows_written, 2);

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().next(), Some("ID,LAT,LON,0.0,0.08333333333333333"));

    let table = load_deformation_table(&output, &ResampleConfig::default()).unwrap();
    assert_eq!(table.points[0].values, vec![Some(2.0), Some(-2.0)]);
    assert_eq!(table.points[1].values, vec![Some(10.0), Some(4.0)]);
    assert_eq!(table.points[1].latitude, Some(42.1));
}

#[test]
fn test_resample_workflow_rejects_table_without_time_columns() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir, "ts.csv", "ID,LAT,LON\nP1,42.0,14.9\n");

    let err = ResampleProcessor::new(input, temp_dir.path().join("out.csv"))
        .unwrap()
        .process()
        .unwrap_err();
    assert!(matches!(err, ProcessorError::InvalidTable { .. }));
}
