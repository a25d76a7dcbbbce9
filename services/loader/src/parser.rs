//! Ingredient file parsing
//!
//! The file is headerless CSV: the first column is the ingredient name, the
//! second its measurement unit. Quoted fields may contain commas and doubled
//! quotes. Extra columns are ignored.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fmt;

/// One parsed ingredient row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRow {
    pub name: String,
    pub measurement_unit: String,
}

/// Why a record was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    MissingUnit,
    EmptyName,
    EmptyUnit,
    Malformed(String),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::MissingUnit => write!(f, "no measurement unit column"),
            LineError::EmptyName => write!(f, "empty ingredient name"),
            LineError::EmptyUnit => write!(f, "empty measurement unit"),
            LineError::Malformed(reason) => write!(f, "malformed record: {}", reason),
        }
    }
}

/// Turn one CSV record into a row
pub fn parse_record(record: &StringRecord) -> Result<IngredientRow, LineError> {
    let name = record.get(0).unwrap_or_default();
    let measurement_unit = record.get(1).ok_or(LineError::MissingUnit)?;

    if name.is_empty() {
        return Err(LineError::EmptyName);
    }
    if measurement_unit.is_empty() {
        return Err(LineError::EmptyUnit);
    }

    Ok(IngredientRow {
        name: name.to_string(),
        measurement_unit: measurement_unit.to_string(),
    })
}

/// Rows parsed from a whole file, plus the rejected records
#[derive(Debug, Default)]
pub struct Parsed {
    pub rows: Vec<IngredientRow>,
    /// 1-based starting line and reason of every rejected record
    pub rejected: Vec<(usize, LineError)>,
}

/// Parse file contents, skipping blank lines and collecting rejections
pub fn parse_contents(contents: &str) -> Parsed {
    let contents = contents.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(contents.as_bytes());

    let mut parsed = Parsed::default();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map_or(0, |pos| pos.line() as usize);
                parsed.rejected.push((line, LineError::Malformed(err.to_string())));
                continue;
            }
        };

        if record.iter().all(str::is_empty) {
            continue;
        }

        let line = record.position().map_or(0, |pos| pos.line() as usize);
        match parse_record(&record) {
            Ok(row) => parsed.rows.push(row),
            Err(reason) => parsed.rejected.push((line, reason)),
        }
    }

    parsed
}
