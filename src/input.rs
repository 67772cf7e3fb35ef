//! Validation of the raw text typed into the entry fields.

use chrono::NaiveDate;

use crate::error::{Field, Result, TrackerError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Return the trimmed text, or [`TrackerError::MissingField`] when it is blank.
pub fn require(text: &str, field: Field) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(TrackerError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

/// Parse a calendar date written exactly as `YYYY-MM-DD`.
///
/// chrono tolerates unpadded fields, leading spaces and a `+` sign, so the
/// shape is checked byte by byte before parsing.
pub fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    if !is_iso_shape(trimmed) {
        return Err(TrackerError::InvalidDate(trimmed.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| TrackerError::InvalidDate(trimmed.to_string()))
}

fn is_iso_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a strictly positive, finite real number.
pub fn parse_positive(text: &str, field: Field) -> Result<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(TrackerError::InvalidNumber {
            field,
            text: trimmed.to_string(),
        }),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
