//! Flat-file loaders for precipitation records, reference indices,
//! deformation tables and turning-point tables.
//!
//! Loading is lenient: a cell or line that cannot be coerced is logged as a
//! parse failure and dropped (or kept as an absent value), never fatal. A
//! missing file or a table without its required columns is fatal.

use crate::config::{HistogramConfig, ResampleConfig};
use crate::constants::{
    API_TABLE_DATE_FORMATS, MAX_DECIMAL_YEAR, PRECIPITATION_DATE_FORMAT, REFERENCE_DATE_FORMATS,
};
use crate::date_parser::{MultiFormatDateParser, parse_with_format};
use crate::error::{ProcessorError, Result};
use crate::models::{
    DeformationPoint, DeformationTable, LoadReport, TimePoint, TurningPointRecord,
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Fail with `MissingResource` unless `path` exists
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ProcessorError::MissingResource {
            path: path.to_path_buf(),
        })
    }
}

/// Read a comma-separated table with every column as text
pub fn read_text_table(path: &Path, has_header: bool) -> Result<DataFrame> {
    ensure_exists(path)?;

    let df = CsvReadOptions::default()
        .with_has_header(has_header)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Lenient number coercion: blank or unparseable cells and NaN are absent
pub fn parse_number(cell: Option<&str>) -> Option<f64> {
    let text = cell?.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Trimmed text cells of a column
pub fn text_cells(column: &Column) -> Result<Vec<Option<String>>> {
    let series = column.as_materialized_series();
    let series = if series.dtype() == &DataType::String {
        series.clone()
    } else {
        series.cast(&DataType::String)?
    };

    Ok(series
        .str()?
        .into_iter()
        .map(|cell| cell.map(|s| s.trim().to_string()))
        .collect())
}

/// Numeric cells of a column; text columns are coerced leniently
pub fn numeric_cells(column: &Column) -> Result<Vec<Option<f64>>> {
    let series = column.as_materialized_series();
    if series.dtype() == &DataType::String {
        return Ok(series.str()?.into_iter().map(parse_number).collect());
    }

    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn required_column<'a>(df: &'a DataFrame, name: &str, path: &Path) -> Result<&'a Column> {
    df.column(name).map_err(|_| {
        ProcessorError::invalid_table(path, format!("missing required column '{}'", name))
    })
}

/// Load a whitespace-delimited `date precipitation` record (`%d/%m/%Y`).
/// Lines whose date or value cannot be parsed are dropped.
pub fn load_precipitation(path: &Path) -> Result<LoadReport<TimePoint>> {
    ensure_exists(path)?;
    let reader = BufReader::new(File::open(path)?);

    let mut report = LoadReport::default();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_precipitation_line(&line) {
            Ok(point) => report.rows.push(point),
            Err(e) => {
                debug!("{}:{}: {}", path.display(), line_num + 1, e);
                report.dropped += 1;
            }
        }
    }

    if report.dropped > 0 {
        warn!(
            "Dropped {} unparseable lines from {}",
            report.dropped,
            path.display()
        );
    }
    debug!("Loaded {} precipitation observations", report.rows.len());
    Ok(report)
}

fn parse_precipitation_line(line: &str) -> Result<TimePoint> {
    let mut fields = line.split_whitespace();
    let (Some(date_text), Some(value_text)) = (fields.next(), fields.next()) else {
        return Err(ProcessorError::parse_failure("precipitation line", line));
    };

    let date = NaiveDate::parse_from_str(date_text, PRECIPITATION_DATE_FORMAT)
        .map_err(|_| ProcessorError::parse_failure("precipitation date", date_text))?;
    let value = parse_number(Some(value_text))
        .ok_or_else(|| ProcessorError::parse_failure("precipitation value", value_text))?;

    Ok(TimePoint::new(date, value))
}

/// Load a headerless `date,mean_precipitation` reference index (e.g. GPM).
///
/// The date format is negotiated over the whole column; rows whose date does
/// not parse are dropped, rows with an unparseable value are kept as absent.
pub fn load_reference_index(path: &Path) -> Result<LoadReport<TimePoint>> {
    let df = read_text_table(path, false)?;
    if df.width() < 2 {
        return Err(ProcessorError::invalid_table(
            path,
            format!("expected 2 columns (date, mean_precipitation), found {}", df.width()),
        ));
    }

    let columns = df.get_columns();
    let raw_dates: Vec<String> = text_cells(&columns[0])?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    let values = numeric_cells(&columns[1])?;

    let parsed = MultiFormatDateParser::new(REFERENCE_DATE_FORMATS.iter().copied())
        .without_century_correction()
        .parse(&raw_dates)?;

    let mut report = LoadReport::default();
    for (date, value) in parsed.dates.into_iter().zip(values) {
        match date {
            Some(date) => report.rows.push(TimePoint { date, value }),
            None => report.dropped += 1,
        }
    }

    if report.dropped > 0 {
        warn!(
            "Dropped {} rows with unparseable dates from {}",
            report.dropped,
            path.display()
        );
    }
    Ok(report)
}

/// Load a `Date,API` monthly table. Columns are taken by position; rows
/// whose date or value cannot be parsed are dropped.
pub fn load_api_monthly(path: &Path) -> Result<LoadReport<TimePoint>> {
    let df = read_text_table(path, true)?;
    if df.width() < 2 {
        return Err(ProcessorError::invalid_table(
            path,
            format!("expected 2 columns (Date, API), found {}", df.width()),
        ));
    }

    let columns = df.get_columns();
    let dates = text_cells(&columns[0])?;
    let values = numeric_cells(&columns[1])?;

    let mut report = LoadReport::default();
    for (date_text, value) in dates.iter().zip(values) {
        let date = date_text.as_deref().and_then(|text| {
            API_TABLE_DATE_FORMATS
                .iter()
                .find_map(|format| parse_with_format(text, format))
        });

        match (date, value) {
            (Some(date), Some(value)) => report.rows.push(TimePoint::new(date, value)),
            _ => {
                debug!(
                    "{}",
                    ProcessorError::parse_failure("API row", date_text.clone().unwrap_or_default())
                );
                report.dropped += 1;
            }
        }
    }

    if report.dropped > 0 {
        warn!("Dropped {} invalid API rows from {}", report.dropped, path.display());
    }
    Ok(report)
}

/// Load a resampled deformation table: identifier columns followed by
/// decimal-year headed sample columns. Blank samples are absent.
pub fn load_deformation_table(path: &Path, config: &ResampleConfig) -> Result<DeformationTable> {
    let df = read_text_table(path, true)?;
    let leading = config.leading_columns;

    if leading == 0 || df.width() <= leading {
        return Err(ProcessorError::invalid_table(
            path,
            format!(
                "expected {} identifier columns followed by time columns, found {} columns",
                leading,
                df.width()
            ),
        ));
    }

    let columns = df.get_columns();
    let times = columns[leading..]
        .iter()
        .map(|column| {
            let name = column.name().as_str();
            let time = name.trim().parse::<f64>().map_err(|_| {
                ProcessorError::invalid_table(path, format!("time header '{}' is not a number", name))
            })?;
            if !time.is_finite() || time.abs() > MAX_DECIMAL_YEAR {
                return Err(ProcessorError::invalid_table(
                    path,
                    format!(
                        "time header '{}' is not a decimal year within +/-{}",
                        name, MAX_DECIMAL_YEAR
                    ),
                ));
            }
            Ok(time)
        })
        .collect::<Result<Vec<f64>>>()?;

    let ids = text_cells(&columns[0])?;
    let latitudes = match columns.get(1).filter(|_| leading >= 3) {
        Some(column) => numeric_cells(column)?,
        None => vec![None; df.height()],
    };
    let longitudes = match columns.get(2).filter(|_| leading >= 3) {
        Some(column) => numeric_cells(column)?,
        None => vec![None; df.height()],
    };
    let samples = columns[leading..]
        .iter()
        .map(numeric_cells)
        .collect::<Result<Vec<_>>>()?;

    let points = (0..df.height())
        .map(|row| DeformationPoint {
            id: ids[row].clone().unwrap_or_default(),
            latitude: latitudes[row],
            longitude: longitudes[row],
            values: samples.iter().map(|column| column[row]).collect(),
        })
        .collect::<Vec<_>>();

    debug!(
        "Loaded deformation table with {} points and {} epochs",
        points.len(),
        times.len()
    );
    Ok(DeformationTable { times, points })
}

/// Turning-point table with its date column negotiated to month codes
#[derive(Debug, Clone, PartialEq)]
pub struct TurningPointDates {
    pub records: Vec<TurningPointRecord>,
    pub date_format: Option<String>,
    pub unparsed_dates: usize,
}

/// Load the id and date columns of a turning-point table
pub fn load_turning_point_dates(
    path: &Path,
    config: &HistogramConfig,
) -> Result<TurningPointDates> {
    let df = read_text_table(path, true)?;
    let ids = text_cells(required_column(&df, &config.id_column, path)?)?;
    let raw_dates: Vec<String> = text_cells(required_column(&df, &config.date_column, path)?)?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();

    let missing_before = raw_dates.iter().filter(|d| d.is_empty()).count();
    debug!(
        "Missing dates in {} before parsing: {}",
        path.display(),
        missing_before
    );

    let parsed = MultiFormatDateParser::new(config.date_formats.iter().cloned()).parse(&raw_dates)?;
    let unparsed_dates = parsed.absent_count();
    let months = parsed.months();

    let records = ids
        .into_iter()
        .zip(months)
        .map(|(id, date)| TurningPointRecord {
            id: id.unwrap_or_default(),
            direction: None,
            slope: None,
            date,
        })
        .collect();

    Ok(TurningPointDates {
        records,
        date_format: parsed.format,
        unparsed_dates,
    })
}

/// Load the direction and slope columns of a turning-point table. The id
/// column is read when present.
pub fn load_turning_point_directions(
    path: &Path,
    config: &HistogramConfig,
) -> Result<Vec<TurningPointRecord>> {
    let df = read_text_table(path, true)?;
    let directions = numeric_cells(required_column(&df, &config.direction_column, path)?)?;
    let slopes = numeric_cells(required_column(&df, &config.slope_column, path)?)?;
    let ids = match df.column(&config.id_column) {
        Ok(column) => text_cells(column)?,
        Err(_) => vec![None; df.height()],
    };

    Ok(ids
        .into_iter()
        .zip(directions.into_iter().zip(slopes))
        .map(|(id, (direction, slope))| TurningPointRecord {
            id: id.unwrap_or_default(),
            direction,
            slope,
            date: None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some(" 2.5 ")), Some(2.5));
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("abc")), None);
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn test_load_precipitation_drops_bad_lines() {
        let file = temp_file("01/01/2011 5.0\n02/01/2011   0\nbad 1.0\n03/01/2011 x\n\n04/01/2011\t2.5\n");
        let report = load_precipitation(file.path()).unwrap();

        assert_eq!(
            report.rows,
            vec![
                TimePoint::new(ymd(2011, 1, 1), 5.0),
                TimePoint::new(ymd(2011, 1, 2), 0.0),
                TimePoint::new(ymd(2011, 1, 4), 2.5),
            ]
        );
        assert_eq!(report.dropped, 2);
    }

    #[test]
    fn test_missing_file_is_missing_resource() {
        let err = load_precipitation(Path::new("/no/such/Pdata.txt")).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingResource { .. }));

        let err = load_api_monthly(Path::new("/no/such/api.csv")).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingResource { .. }));
    }

    #[test]
    fn test_load_api_monthly_accepts_both_date_styles() {
        let file = temp_file("Date,API\n2011-01-31,12.5\n02/28/2011,7.0\nnot-a-date,1.0\n2011-03-31,\n");
        let report = load_api_monthly(file.path()).unwrap();
        assert_eq!(
            report.rows,
            vec![
                TimePoint::new(ymd(2011, 1, 31), 12.5),
                TimePoint::new(ymd(2011, 2, 28), 7.0),
            ]
        );
        assert_eq!(report.dropped, 2);
    }

    #[test]
    fn test_load_reference_index() {
        let file = temp_file("2011-01-01,80.5\n2011-02-01,oops\nwhenever,3.0\n2011-03-01,60\n");
        let report = load_reference_index(file.path()).unwrap();
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0], TimePoint::new(ymd(2011, 1, 1), 80.5));
        assert_eq!(report.rows[1], TimePoint::absent(ymd(2011, 2, 1)));
        assert_eq!(report.rows[2], TimePoint::new(ymd(2011, 3, 1), 60.0));
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn test_load_deformation_table() {
        let file = temp_file("ID,LAT,LON,0.0,0.08333333333333333,0.16666666666666666\nP1,42.0,14.9,0.0,-1.5,\nP2,42.1,15.0,1.0,2.0,3.0\n");
        let table = load_deformation_table(file.path(), &ResampleConfig::default()).unwrap();

        assert_eq!(table.times.len(), 3);
        assert!((table.times[1] - 1.0 / 12.0).abs() < 1e-12);
        assert_eq!(table.points.len(), 2);
        assert_eq!(table.points[0].id, "P1");
        assert_eq!(table.points[0].latitude, Some(42.0));
        assert_eq!(table.points[0].values, vec![Some(0.0), Some(-1.5), None]);
        assert_eq!(table.find("P2").unwrap().values[2], Some(3.0));
    }

    #[test]
    fn test_deformation_table_rejects_bad_headers() {
        let file = temp_file("ID,LAT,LON,zero\nP1,42.0,14.9,0.0\n");
        let err = load_deformation_table(file.path(), &ResampleConfig::default()).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidTable { .. }));
    }

    #[test]
    fn test_deformation_table_rejects_out_of_range_headers() {
        for header in ["1e20", "-1e9", "inf", "NaN"] {
            let file = temp_file(&format!("ID,LAT,LON,0.0,{}\nP1,42.0,14.9,0.0,1.0\n", header));
            let err = load_deformation_table(file.path(), &ResampleConfig::default()).unwrap_err();
            assert!(
                matches!(err, ProcessorError::InvalidTable { .. }),
                "{} gave {:?}",
                header,
                err
            );
        }
    }

    #[test]
    fn test_load_turning_point_dates() {
        let file = temp_file("ID,Date (mm/yyyy),Direction,Slope\nA,21-Jan,-3.5,-0.2\nB,bad,4.0,0.1\nC,19-Dec,12.0,1.0\n");
        let loaded = load_turning_point_dates(file.path(), &HistogramConfig::default()).unwrap();

        assert_eq!(loaded.date_format.as_deref(), Some("%y-%b"));
        assert_eq!(loaded.unparsed_dates, 1);
        assert_eq!(loaded.records.len(), 3);
        assert_eq!(
            loaded.records[2].date,
            Some(crate::models::YearMonth { year: 2019, month: 12 })
        );
        assert_eq!(loaded.records[1].date, None);
    }

    #[test]
    fn test_load_turning_point_directions() {
        let file = temp_file("ID,Date (mm/yyyy),Direction,Slope\nA,21-Jan,-3.5,-0.2\nB,bad,,0.1\n");
        let records = load_turning_point_directions(file.path(), &HistogramConfig::default()).unwrap();
        assert_eq!(records[0].direction, Some(-3.5));
        assert_eq!(records[0].slope, Some(-0.2));
        assert_eq!(records[1].direction, None);
        assert_eq!(records[1].id, "B");
    }

    #[test]
    fn test_missing_required_column() {
        let file = temp_file("ID,Direction\nA,1.0\n");
        let err = load_turning_point_directions(file.path(), &HistogramConfig::default()).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidTable { .. }));
    }
}
