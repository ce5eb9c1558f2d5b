//! Normalization of Graph API timestamps.
//!
//! Instagram reports media timestamps as `2024-01-01T00:00:00+0000`, but older
//! payloads and hand-written fixtures use RFC 3339 or omit the offset entirely.
//! Everything is reduced to a UTC instant; anything unparseable becomes `None`
//! so a bad timestamp never aborts a sync.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Formats with an explicit numeric offset. `%z` accepts `+0200` and `+02:00`;
/// the `%#z` entries also take an hour-only `+02`.
const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Formats without an offset; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Convert a raw remote timestamp into a UTC instant.
///
/// Absent, empty, and unparseable input all yield `None`. Input without an
/// offset is taken to be UTC, and a bare date means midnight UTC. Input with an
/// offset keeps its instant but is re-expressed in UTC.
#[must_use]
pub fn normalize(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let value = raw.map(str::trim).filter(|s| !s.is_empty())?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = AWARE_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    // A trailing `Z` on a space-separated value is not RFC 3339, but it is still UTC.
    let naive_part = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .unwrap_or(value);

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive_part, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Render an instant in the canonical storage/transfer form.
///
/// Fixed-width RFC 3339 with microseconds and a `Z` suffix, so stored values
/// sort chronologically as plain text.
#[must_use]
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}
