//! Backend timestamps (stored in UTC) rendered in the viewer's zone.

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use super::column::Formatter;

/// `DD/MM/YYYY, HH:MM`, 24-hour clock.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y, %H:%M";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a stored timestamp. Values without an offset are UTC.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Format `raw` in `tz`. Unparseable input is returned unchanged.
pub fn format_in<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    parse_utc(raw).map_or_else(
        || raw.to_owned(),
        |dt| dt.with_timezone(tz).format(DISPLAY_FORMAT).to_string(),
    )
}

/// Format `raw` in the local zone of the machine running the UI.
pub fn format_local(raw: &str) -> String {
    format_in(raw, &Local)
}

/// Column formatter for the local zone.
pub fn local_formatter() -> Formatter {
    Arc::new(format_local)
}

/// Column formatter for a fixed zone.
pub fn formatter_in<Tz>(tz: Tz) -> Formatter
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Display,
{
    Arc::new(move |raw: &str| format_in(raw, &tz))
}
