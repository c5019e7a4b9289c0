//! CSV loading for the coral bleaching dataset.
//!
//! Every file is read with all columns as strings and parsed here, so a bad
//! cell is reported with its line and column instead of silently becoming
//! null. One malformed row fails the whole load.

use std::path::Path;
use std::str::FromStr;

use polars::prelude::*;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{CoralError, Result};
use crate::model::{GeoTable, SeverityToSSTAs, YearToSeverities};
use crate::schema::{bleaching, geo};

/// Layout of the bleaching CSV: positions for the correlation and yearly
/// loaders, header names for the map table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub date_idx: usize,
    pub severity_idx: usize,
    pub ssta_idx: usize,
    /// Cell value meaning "no SSTA recorded". Matched exactly.
    pub missing_marker: String,
    pub date_column: String,
    pub latitude_column: String,
    pub longitude_column: String,
    pub severity_column: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            date_idx: bleaching::DATE_IDX,
            severity_idx: bleaching::SEVERITY_IDX,
            ssta_idx: bleaching::SSTA_IDX,
            missing_marker: bleaching::MISSING.to_string(),
            date_column: geo::DATE.to_string(),
            latitude_column: geo::LATITUDE.to_string(),
            longitude_column: geo::LONGITUDE.to_string(),
            severity_column: geo::SEVERITY.to_string(),
        }
    }
}

// ── Loaders ─────────────────────────────────────────────────────────────────

/// Severity → SSTA readings. Rows whose SSTA is the missing marker are
/// skipped.
pub fn load_severity_sstas(path: &Path, config: &LoaderConfig) -> Result<SeverityToSSTAs> {
    let df = read_csv_as_strings(path)?;
    let (severity_name, severities) = string_column(&df, config.severity_idx)?;
    let (ssta_name, sstas) = string_column(&df, config.ssta_idx)?;

    let mut data = SeverityToSSTAs::new();
    let mut skipped = 0usize;
    for (row, (severity, ssta)) in severities.into_iter().zip(sstas).enumerate() {
        if ssta == Some(config.missing_marker.as_str()) {
            skipped += 1;
            continue;
        }
        let key: f64 = parse_cell(severity, row, severity_name)?;
        let reading: f64 = parse_cell(ssta, row, ssta_name)?;
        data.get_or_insert_with(key, Vec::new).push(reading);
    }

    info!(
        path = %path.display(),
        rows = df.height(),
        skipped,
        severities = data.len(),
        "loaded severity/SSTA readings"
    );
    Ok(data)
}

/// Year → severity readings. The year is the first four characters of the
/// compound date field.
pub fn load_year_severities(path: &Path, config: &LoaderConfig) -> Result<YearToSeverities> {
    let df = read_csv_as_strings(path)?;
    let (date_name, dates) = string_column(&df, config.date_idx)?;
    let (severity_name, severities) = string_column(&df, config.severity_idx)?;

    let mut data = YearToSeverities::new();
    for (row, (date, severity)) in dates.into_iter().zip(severities).enumerate() {
        let raw = date.unwrap_or_default();
        let prefix: String = raw.chars().take(4).collect();
        let year: i32 = prefix
            .trim()
            .parse()
            .map_err(|_| malformed(row, date_name, raw))?;
        let reading: f64 = parse_cell(severity, row, severity_name)?;
        data.entry(year).or_default().push(reading);
    }

    info!(
        path = %path.display(),
        rows = df.height(),
        years = data.len(),
        "loaded yearly severity readings"
    );
    Ok(data)
}

/// The whole file as a table, with the date column parsed to integers and
/// coordinates and severity parsed to floats.
///
/// The configured columns come out under the [`geo`] names; their source
/// columns are dropped when named differently.
pub fn load_geo_table(path: &Path, config: &LoaderConfig) -> Result<GeoTable> {
    let mut df = read_csv_as_strings(path)?;

    let dates: Vec<i64> = parse_named_column(&df, &config.date_column)?;
    let mut typed = vec![(
        config.date_column.as_str(),
        Series::new(geo::DATE.into(), dates),
    )];
    for (source, name) in [
        (&config.latitude_column, geo::LATITUDE),
        (&config.longitude_column, geo::LONGITUDE),
        (&config.severity_column, geo::SEVERITY),
    ] {
        let values: Vec<f64> = parse_named_column(&df, source)?;
        typed.push((source.as_str(), Series::new(name.into(), values)));
    }

    // a source may carry another typed column's name; drop them all first
    for (source, series) in &typed {
        if *source != series.name().as_str() && df.get_column_index(source).is_some() {
            df.drop_in_place(source)?;
        }
    }
    for (_, series) in typed {
        df.with_column(series)?;
    }

    info!(path = %path.display(), rows = df.height(), "loaded geographic table");
    GeoTable::new(df)
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Read a CSV into a DataFrame with every column as String.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame> {
    debug!(path = %path.display(), "reading csv");
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    // Trim whitespace from column names
    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

fn string_column(df: &DataFrame, idx: usize) -> Result<(&str, &StringChunked)> {
    let column = df.select_at_idx(idx).ok_or_else(|| {
        CoralError::MissingColumn(format!("index {idx} (file has {} columns)", df.width()))
    })?;
    Ok((column.name().as_str(), column.str()?))
}

fn parse_named_column<T: FromStr>(df: &DataFrame, name: &str) -> Result<Vec<T>> {
    let column = df
        .column(name)
        .map_err(|_| CoralError::MissingColumn(name.to_string()))?;
    column
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, cell)| parse_cell(cell, row, name))
        .collect()
}

fn parse_cell<T: FromStr>(cell: Option<&str>, row: usize, column: &str) -> Result<T> {
    let raw = cell.unwrap_or_default();
    raw.trim().parse().map_err(|_| malformed(row, column, raw))
}

/// `row` is the 0-based data row; lines count the header and start at 1.
fn malformed(row: usize, column: &str, value: &str) -> CoralError {
    CoralError::MalformedInput {
        line: row + 2,
        column: column.to_string(),
        value: value.to_string(),
    }
}
