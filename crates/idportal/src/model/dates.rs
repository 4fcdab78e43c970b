//! Date normalization shared by the card, the status lookup and the summary.
//!
//! Stored dates arrive in several shapes (`1990-01-15`, RFC 3339 datetimes,
//! `15-01-1990 10:30:00.000`). Display always uses `DD-MM-YYYY`; anything
//! unrecognised is shown as [`NOT_AVAILABLE`].

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Sentinel shown wherever a value is missing or unparseable.
pub const NOT_AVAILABLE: &str = "N/A";

static RE_LEADING_YMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})").unwrap());
static RE_LEADING_DMY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})-([0-9]{2})-([0-9]{4})").unwrap());
static RE_ANY_YMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{4})[-/.]([0-9]{1,2})[-/.]([0-9]{1,2})").unwrap());
static RE_ANY_DMY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,2})[-/.]([0-9]{1,2})[-/.]([0-9]{4})").unwrap());

/// Formats a stored date string as `DD-MM-YYYY`.
///
/// Accepts `YYYY-MM-DD`, anything starting with `YYYY-MM-DD` (ISO datetimes)
/// and anything starting with `DD-MM-YYYY`. Other input yields `"N/A"`.
pub fn format_display_date(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return NOT_AVAILABLE.to_string();
    }

    if let Some(caps) = RE_LEADING_YMD.captures(value) {
        return format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]);
    }

    if let Some(caps) = RE_LEADING_DMY.captures(value) {
        return format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
    }

    NOT_AVAILABLE.to_string()
}

/// Formats an optional date, treating `None` like an empty string.
pub fn format_optional_date(value: Option<&str>) -> String {
    format_display_date(value.unwrap_or_default())
}

/// Extracts the calendar date from a loosely formatted date or datetime.
///
/// Year-first dates are searched anywhere in the string (so RFC 3339 values
/// with any time or offset reduce to their literal date part). Day-first
/// dates are accepted with `-`, `/` or `.` separators. Returns `None` when no
/// valid calendar date is present.
pub fn extract_date_part(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(caps) = RE_ANY_YMD.captures(value) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = RE_ANY_DMY.captures(value) {
        return ymd(&caps[3], &caps[2], &caps[1]);
    }

    None
}

/// Returns the `YYYY-MM-DD` date part of a value, if it has one.
pub fn date_part_string(value: &str) -> Option<String> {
    extract_date_part(value).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Compares two date values by calendar date only.
///
/// Both sides must parse; a value without a recognisable date never matches.
pub fn same_date(left: &str, right: &str) -> bool {
    match (extract_date_part(left), extract_date_part(right)) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year = year.parse().ok()?;
    let month = month.parse().ok()?;
    let day = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
