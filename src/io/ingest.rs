//! CSV ingest with a strict schema.
//!
//! This module is responsible for turning the incidence CSV into typed
//! `IncidenceRecord`s. Unlike a lenient loader it never skips rows: the
//! first missing column or malformed value aborts the run with a schema
//! error, before any output has been written.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{IncidenceRecord, Season};
use crate::error::AppError;

/// Columns every input file must carry (canonical spelling).
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Date",
    "State",
    "Disease",
    "Disease_Count",
    "Year",
    "Month",
    "Season",
];

/// Ingest output: typed rows plus a little bookkeeping for reports.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<IncidenceRecord>,
    pub rows_read: usize,
}

/// Load and validate every row of the incidence CSV.
pub fn load_incidence_records(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::schema(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let missing = missing_columns(&header_map);
    if !missing.is_empty() {
        return Err(AppError::schema(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because records() starts after the header and lines are 1-based.
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::schema(format!("Line {line}: CSV parse error: {e}")))?;
        let row = parse_row(&record, &header_map).map_err(|e| AppError::schema(format!("Line {line}: {e}")))?;
        records.push(row);
    }

    if records.is_empty() {
        return Err(AppError::data(format!(
            "No data rows in '{}'.",
            path.display()
        )));
    }

    let rows_read = records.len();
    log::info!("Loaded {rows_read} incidence rows from {}", path.display());

    Ok(IngestedData { records, rows_read })
}

fn missing_columns(header_map: &HashMap<String, usize>) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .into_iter()
        .filter(|name| !header_map.contains_key(&normalize_header_name(name)))
        .collect()
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<IncidenceRecord, String> {
    let date = parse_date(get_required(record, header_map, "Date")?)?;
    let state = get_required(record, header_map, "State")?.to_string();
    let disease = get_required(record, header_map, "Disease")?.to_string();

    let raw_count = get_required(record, header_map, "Disease_Count")?;
    let count = raw_count
        .parse::<i64>()
        .map_err(|_| format!("Invalid `Disease_Count` '{raw_count}' (expected a non-negative integer)."))?;
    let count = u32::try_from(count)
        .map_err(|_| format!("Invalid `Disease_Count` {count} (must be a non-negative integer)."))?;

    let raw_year = get_required(record, header_map, "Year")?;
    let year = raw_year
        .parse::<i32>()
        .map_err(|_| format!("Invalid `Year` '{raw_year}'."))?;

    let raw_month = get_required(record, header_map, "Month")?;
    let month = raw_month
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| format!("Invalid `Month` '{raw_month}' (expected 1-12)."))?;

    let raw_season = get_required(record, header_map, "Season")?;
    let season = Season::from_name(raw_season).ok_or_else(|| {
        format!("Unknown `Season` '{raw_season}' (expected one of: Winter, Spring, Summer, Autumn).")
    })?;

    Ok(IncidenceRecord {
        date,
        state,
        disease,
        count,
        year,
        month,
        season,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(&normalize_header_name(name))
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("Invalid date '{s}'. Expected YYYY-MM-DD."))
}
