// Cell normalization: raw worksheet cells -> canonical field values.
//
// Branches on the column's kind tag, never on header text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::CellNormalizationError;
use crate::schema::{ColumnKind, ColumnSchema};
use crate::value::{FieldValue, RawCell};

/// Day offset from the spreadsheet epoch (serial 0 = 1899-12-30) to 1970-01-01.
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const SECONDS_PER_DAY: i64 = 86_400;

/// Largest serial a spreadsheet can hold (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Naive date-time layouts accepted after the space separator becomes `T`.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Normalize one cell for its column. `Ok(None)` means the cell is empty.
pub fn normalize(
    column: &ColumnSchema,
    raw: &RawCell,
) -> Result<Option<FieldValue>, CellNormalizationError> {
    if raw.is_blank() {
        return Ok(None);
    }

    let value = match (column.kind, raw) {
        (_, RawCell::Empty) => return Ok(None),
        (_, RawCell::Error(e)) => return Err(CellNormalizationError::ErrorCell(e.clone())),

        (ColumnKind::DateLike, RawCell::Number(n) | RawCell::DateSerial(n)) => {
            FieldValue::Date(decode_date_serial(*n)?)
        }
        (ColumnKind::DateLike, RawCell::Text(s) | RawCell::DateIso(s)) => {
            FieldValue::Date(parse_date_text(s)?)
        }

        (ColumnKind::BooleanFlag, RawCell::Bool(b)) => {
            FieldValue::Text(if *b { "Yes" } else { "No" }.to_string())
        }

        (ColumnKind::PlainNumber, RawCell::Text(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(s.clone()),
        },

        (_, RawCell::Text(s) | RawCell::DateIso(s)) => FieldValue::Text(s.clone()),
        (_, RawCell::Number(n) | RawCell::DateSerial(n)) => FieldValue::Number(*n),
        (_, RawCell::Bool(b)) => FieldValue::Bool(*b),
    };

    Ok(Some(value))
}

/// Decode a spreadsheet date serial to UTC midnight of that day.
///
/// `1970-01-01 + floor(serial - 25569)` days; the fractional (time) part is dropped.
pub fn decode_date_serial(serial: f64) -> Result<DateTime<Utc>, CellNormalizationError> {
    if !serial.is_finite() || !(0.0..MAX_SERIAL + 1.0).contains(&serial) {
        return Err(CellNormalizationError::SerialOutOfRange(serial));
    }

    let days = (serial - UNIX_EPOCH_SERIAL).floor() as i64;
    DateTime::<Utc>::from_timestamp(days * SECONDS_PER_DAY, 0)
        .ok_or(CellNormalizationError::SerialOutOfRange(serial))
}

/// Parse an ISO-like date or date-time string.
///
/// A space between date and time is accepted as `T`. Values without an offset are UTC.
pub fn parse_date_text(text: &str) -> Result<DateTime<Utc>, CellNormalizationError> {
    let trimmed = text.trim();
    let candidate = trimmed.replacen(' ', "T", 1);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&candidate) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&candidate, fmt) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CellNormalizationError::UnparseableDate(text.to_string()))
}
