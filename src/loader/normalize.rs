//! Cell normalization for values read from the input tables.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Excel serial dates count days from this origin.
const SERIAL_ORIGIN: (i32, u32, u32) = (1900, 1, 1);

/// Largest serial Excel can represent (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Canonical form of a plant code used as join key.
///
/// Integral numbers lose their float formatting so that `"1234.0"`,
/// `" 1234 "` and `"01234"` all join with `"1234"`.
pub fn normalize_plant_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
            return format!("{}", value as i64);
        }
    }
    trimmed.to_string()
}

/// Parse a date cell. Returns `None` for empty or unrecognized values.
///
/// Accepts ISO dates, US dates, dotted European dates, the same with a
/// time part, and Excel serial numbers (fractional days keep their time).
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let serial = s.parse::<f64>().ok()?;
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_ORIGIN;
    let origin = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    origin.checked_add_signed(Duration::seconds(seconds))
}

/// Parse a quantity cell; empty cells count as zero.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reduce free text to lowercase words without codes.
///
/// Non-alphanumeric characters become spaces, any token holding a digit
/// (`820235055`, `D245`, `AGG3858`) is dropped and whitespace collapses.
pub fn normalize_text(raw: &str) -> String {
    let spaced: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    spaced
        .split_whitespace()
        .filter(|token| !token.chars().any(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}
