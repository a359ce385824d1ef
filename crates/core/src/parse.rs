//! Field parsing for collector CSV columns.
//!
//! Every parser returns `None` instead of failing: an unparseable field becomes
//! a missing value and the row it belongs to is kept.

use crate::types::{Price, Size};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;

/// Date-time layouts written by the collectors, tried in order.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse a timestamp cell.
///
/// Offsets in RFC 3339 values are folded into UTC and dropped. Bare numbers
/// are Unix epoch seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    parse_epoch_seconds(s)
}

fn parse_epoch_seconds(s: &str) -> Option<NaiveDateTime> {
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }

    let secs = s.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc())
}

/// Parse a price cell. Non-finite values are missing.
pub fn parse_price(raw: &str) -> Option<Price> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(OrderedFloat)
}

/// Parse a quantity cell. Negative and non-finite values are missing.
pub fn parse_quantity(raw: &str) -> Option<Size> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}
