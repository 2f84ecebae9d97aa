//! Lenient date parsing for date-of-birth values.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ORDINAL_SUFFIX: Regex = Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Numeric formats, tried in order. Month-first comes before day-first so
/// that ambiguous values like `01/02/1990` read as January 2nd.
const NUMERIC_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y",
];

/// Two-digit years: 70-99 read as 19xx, 00-69 as 20xx.
const SHORT_YEAR_FORMATS: &[&str] = &["%m/%d/%y", "%m-%d-%y", "%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

/// Formats with a month name (full or abbreviated).
const NAMED_FORMATS: &[&str] = &["%B %d, %Y", "%B %d %Y", "%d %B %Y", "%d %B, %Y", "%Y %B %d"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a date written in one of the common certificate styles.
///
/// Returns `None` for empty or unrecognizable input.
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let value = normalize(value);
    if value.is_empty() {
        return None;
    }

    // `%Y` also accepts one or two digits; those are left to the short-year forms.
    if let Some(date) = NUMERIC_FORMATS
        .iter()
        .chain(NAMED_FORMATS)
        .filter_map(|fmt| NaiveDate::parse_from_str(&value, fmt).ok())
        .find(|date| date.year() >= 1000)
    {
        return Some(date);
    }

    if let Some(date) = SHORT_YEAR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&value, fmt).ok())
    {
        return Some(date);
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&value, fmt).ok())
    {
        return Some(dt.date());
    }

    DateTime::parse_from_rfc3339(&value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Collapse whitespace, drop ordinal suffixes and trailing periods.
fn normalize(value: &str) -> String {
    let value = value.trim().trim_end_matches('.');
    let value = ORDINAL_SUFFIX.replace_all(value, "$1");
    WHITESPACE.replace_all(&value, " ").into_owned()
}
