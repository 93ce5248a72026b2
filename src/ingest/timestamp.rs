// src/ingest/timestamp.rs
//! Lenient publication-time parsing. Feeds disagree wildly on formats, so we try
//! the well-known ones first and then walk a list of looser patterns.
//! Anything without an explicit offset is taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::error::TimestampError;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%a %b %d %H:%M:%S %z %Y",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%B %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%d %b %Y"];

// Zone names seen in the wild that chrono's offset parser does not accept.
const ZONE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("UTC", "+0000"),
    ("GMT", "+0000"),
    ("UT", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("AKST", "-0900"),
    ("AKDT", "-0800"),
    ("HST", "-1000"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
];

/// Parse a raw feed timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(TimestampError::Absent);
    }

    if let Some(dt) = parse_well_known(s) {
        return Ok(dt);
    }

    let s = expand_zone_suffix(s);

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Ok(ndt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            if let Some(ndt) = d.and_hms_opt(0, 0, 0) {
                return Ok(ndt.and_utc());
            }
        }
    }

    // Bare unix seconds
    if (9..=11).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(dt) = s.parse::<i64>().ok().and_then(|n| DateTime::from_timestamp(n, 0)) {
            return Ok(dt);
        }
    }

    Err(TimestampError::Unparseable(raw.to_string()))
}

/// Parse an optional raw timestamp; `None` and blanks are `Absent`.
pub fn parse_optional(raw: Option<&str>) -> Result<DateTime<Utc>, TimestampError> {
    raw.map(parse_timestamp).unwrap_or(Err(TimestampError::Absent))
}

/// `now - published <= window`, inclusive at the edge. Future timestamps count as recent.
pub fn within_window(published: DateTime<Utc>, now: DateTime<Utc>, window: chrono::Duration) -> bool {
    now.signed_duration_since(published) <= window
}

fn parse_well_known(s: &str) -> Option<DateTime<Utc>> {
    let odt = OffsetDateTime::parse(s, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(s, &Rfc2822))
        .ok();
    if let Some(odt) = odt {
        return DateTime::from_timestamp(odt.unix_timestamp(), odt.nanosecond());
    }
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Replace a trailing zone name (`EST`, `UTC`, ...) or a glued `Z` with a numeric offset.
fn expand_zone_suffix(s: &str) -> String {
    if let Some((head, last)) = s.rsplit_once(' ') {
        let upper = last.to_ascii_uppercase();
        if let Some((_, off)) = ZONE_ABBREVIATIONS.iter().find(|(name, _)| *name == upper) {
            return format!("{} {}", head.trim_end(), off);
        }
    }
    let bytes = s.as_bytes();
    if bytes.len() > 1
        && matches!(bytes[bytes.len() - 1], b'Z' | b'z')
        && bytes[bytes.len() - 2].is_ascii_digit()
    {
        return format!("{}+0000", &s[..s.len() - 1]);
    }
    s.to_string()
}
