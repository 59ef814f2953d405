//! Lenient text-to-value conversions applied to raw sheet cells.
//!
//! Conversions never fail: unparseable input collapses to the zero value of
//! the target type and is left for validation to judge.

use std::collections::BTreeMap;

use time::format_description::well_known::Rfc3339;
use time::macros::datetime;
use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};

/// Instant used for dates that are empty or unrecognised.
pub const ZERO_INSTANT: OffsetDateTime = datetime!(0001-01-01 0:00 UTC);

/// Day zero of spreadsheet serial dates.
const SERIAL_EPOCH: OffsetDateTime = datetime!(1899-12-30 0:00 UTC);
const NANOS_PER_DAY: f64 = 86_400_000_000_000.0;
/// Serial of 0000-01-01; earlier instants have no RFC 3339 rendering.
const MIN_SERIAL_DAYS: f64 = -693_959.0;
/// Serial of 10000-01-01 (exclusive).
const MAX_SERIAL_DAYS: f64 = 2_958_466.0;

#[must_use]
pub fn to_int(raw: &str) -> i64 {
    raw.parse().unwrap_or(0)
}

#[must_use]
pub fn to_decimal(raw: &str) -> f64 {
    raw.parse().unwrap_or(0.0)
}

#[must_use]
pub fn to_optional_text(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_owned())
}

/// Parses an embedded JSON object of string values.
///
/// Empty or unparseable text yields `None`; parse errors are not surfaced.
#[must_use]
pub fn to_json_map(raw: &str) -> Option<BTreeMap<String, String>> {
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}

/// Parses a date cell, trying each accepted encoding in turn.
///
/// Accepted: spreadsheet serial numbers, `DD-MM-YY`, `DD/MM/YYYY` (then
/// `MM/DD/YYYY`), `DD-MM-YYYY`, `YYYY-MM-DD` and RFC 3339 timestamps.
#[must_use]
pub fn to_date(raw: &str) -> OffsetDateTime {
    let text = raw.trim();
    if text.is_empty() {
        return ZERO_INSTANT;
    }
    if let Ok(serial) = text.parse::<f64>() {
        return from_serial(serial).unwrap_or(ZERO_INSTANT);
    }

    let bytes = text.as_bytes();
    let parsed = match bytes.len() {
        8 if sep_at(bytes, 2, b'-') && sep_at(bytes, 5, b'-') => {
            calendar_opt(number(text, 6, 8).map(short_year), number(text, 3, 5), number(text, 0, 2))
        }
        10 if sep_at(bytes, 2, b'/') && sep_at(bytes, 5, b'/') => {
            let year = number(text, 6, 10);
            calendar_opt(year, number(text, 3, 5), number(text, 0, 2))
                .or_else(|| calendar_opt(year, number(text, 0, 2), number(text, 3, 5)))
        }
        10 if sep_at(bytes, 2, b'-') && sep_at(bytes, 5, b'-') => {
            calendar_opt(number(text, 6, 10), number(text, 3, 5), number(text, 0, 2))
        }
        10 if sep_at(bytes, 4, b'-') && sep_at(bytes, 7, b'-') => {
            calendar_opt(number(text, 0, 4), number(text, 5, 7), number(text, 8, 10))
        }
        len if len >= 20 && sep_at(bytes, 4, b'-') && sep_at(bytes, 10, b'T') => {
            OffsetDateTime::parse(text, &Rfc3339)
                .ok()
                .map(|dt| dt.to_offset(UtcOffset::UTC))
        }
        _ => None,
    };
    parsed.unwrap_or(ZERO_INSTANT)
}

/// Converts a spreadsheet serial date (days since 1899-12-30, fractional
/// part = time of day) into an instant.
#[must_use]
pub fn from_serial(serial: f64) -> Option<OffsetDateTime> {
    if !(MIN_SERIAL_DAYS..MAX_SERIAL_DAYS).contains(&serial) {
        return None;
    }
    let days = serial.trunc();
    let fraction = serial - days;
    #[allow(clippy::cast_possible_truncation)]
    let (days, nanos) = (days as i64, (fraction * NANOS_PER_DAY).trunc() as i64);
    SERIAL_EPOCH
        .checked_add(Duration::days(days))?
        .checked_add(Duration::nanoseconds(nanos))
}

fn sep_at(bytes: &[u8], index: usize, expected: u8) -> bool {
    bytes.get(index) == Some(&expected)
}

fn number(text: &str, start: usize, end: usize) -> Option<i32> {
    let digits = text.get(start..end)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// Two-digit years pivot at 69: 69..=99 → 19xx, 00..=68 → 20xx.
const fn short_year(value: i32) -> i32 {
    if value >= 69 { 1900 + value } else { 2000 + value }
}

fn calendar_opt(year: Option<i32>, month: Option<i32>, day: Option<i32>) -> Option<OffsetDateTime> {
    let month = Month::try_from(u8::try_from(month?).ok()?).ok()?;
    let day = u8::try_from(day?).ok()?;
    let year = year?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(date.midnight().assume_utc())
}
