//! Shared parsing utilities for the crime and weather sources.
//!
//! Timestamps are read as naive wall-clock times and mapped 1:1 onto the
//! epoch axis. The reverse mapping in [`naive_from_epoch`] uses the same
//! convention, so derived calendar fields always agree with the source text.

use chrono::{DateTime, NaiveDateTime};

/// Tokens read as a missing value, matching the defaults of common CSV
/// tooling for public data exports.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns `true` if the field holds no value.
#[must_use]
pub fn is_null(field: &str) -> bool {
    NA_VALUES.contains(&field.trim())
}

/// Parses a timestamp with the given `chrono` format into epoch seconds.
#[must_use]
pub fn parse_epoch(s: &str, format: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(s.trim(), format)
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}

/// Converts epoch seconds back to the naive wall-clock time it was parsed
/// from.
///
/// Falls back to the Unix epoch for values outside `chrono`'s range, which
/// no parsed timestamp can produce.
#[must_use]
pub fn naive_from_epoch(epoch: i64) -> NaiveDateTime {
    DateTime::from_timestamp(epoch, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .naive_utc()
}

/// Parses a finite floating-point value. Missing, non-numeric, infinite, and
/// NaN inputs all yield `None`.
#[must_use]
pub fn parse_finite(s: &str) -> Option<f64> {
    if is_null(s) {
        return None;
    }
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses an hourly precipitation reading, treating `trace_marker` as zero.
#[must_use]
pub fn parse_precipitation(s: &str, trace_marker: &str) -> Option<f64> {
    if s.trim() == trace_marker {
        return Some(0.0);
    }
    parse_finite(s)
}
