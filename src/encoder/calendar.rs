//! Event instants: lenient form input in, iCalendar basic UTC out.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const BASIC_UTC: &str = "%Y%m%dT%H%M%SZ";

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    BASIC_UTC,
];

/// All-day values, read as midnight UTC
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Parse a form-supplied instant. Offsets are honored; naive values are taken as UTC
/// and a bare date is midnight UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// iCalendar UTC basic format, e.g. `20250101T120000Z`
pub fn to_basic_utc(instant: &DateTime<Utc>) -> String {
    instant.format(BASIC_UTC).to_string()
}

/// Parse a `DTSTART`/`DTEND` value. Floating times (no `Z`) are taken as UTC.
pub fn parse_ical(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, BASIC_UTC)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// RFC 3339 rendering used in classified event details
pub fn to_display(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
