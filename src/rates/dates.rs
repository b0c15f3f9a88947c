//! Calendar-date normalization for broker timestamps.
//!
//! Row dates arrive as `DD/MM/YYYY HH:MM` strings (sometimes with seconds,
//! sometimes without a time) or as spreadsheet serial numbers. Everything is
//! reduced to a `NaiveDate` before it is compared with rate sample dates.

use chrono::{Duration, NaiveDate};

use crate::error::EnrichError;
use crate::sheet::CellValue;

const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Reduce a timestamp string to its calendar date, dropping any time part
pub fn normalize_date(raw: &str) -> Result<NaiveDate, EnrichError> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .ok_or_else(|| EnrichError::InvalidDate(raw.to_string()))
}

/// Convert a spreadsheet serial (days since 1899-12-30) to a date
pub fn date_from_serial(serial: f64) -> Result<NaiveDate, EnrichError> {
    if !serial.is_finite() || serial < 0.0 {
        return Err(EnrichError::InvalidDate(serial.to_string()));
    }
    let excel_epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .ok_or_else(|| EnrichError::InvalidDate("spreadsheet epoch".to_string()))?;
    excel_epoch
        .checked_add_signed(Duration::days(serial.floor() as i64))
        .ok_or_else(|| EnrichError::InvalidDate(serial.to_string()))
}

/// Date held by a cell; blank text is `None`
pub fn date_from_cell(value: &CellValue) -> Result<Option<NaiveDate>, EnrichError> {
    match value {
        CellValue::Text(text) if text.trim().is_empty() => Ok(None),
        CellValue::Text(text) => normalize_date(text).map(Some),
        CellValue::Number(serial) | CellValue::DateTime(serial) => {
            date_from_serial(*serial).map(Some)
        }
        CellValue::Bool(b) => Err(EnrichError::InvalidDate(b.to_string())),
    }
}
