//! Provider timestamp parsing and UTC conversion.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::report::SkipReason;

/// XMLTV timestamp layout, also used by some provider exports.
const XMLTV_INPUT_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Local wall-clock layouts, interpreted in the provider timezone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date-only layout.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A parsed provider timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTime {
    /// Exact instant.
    Instant(DateTime<Utc>),
    /// Calendar date without a time of day.
    Day(NaiveDate),
}

/// Parses a provider timestamp.
///
/// Offset-carrying values (RFC 3339, XMLTV) keep their offset; naive values
/// are read as wall-clock time in `tz`. Ambiguous wall-clock times resolve
/// to the earlier instant.
///
/// # Errors
///
/// Returns `SkipReason::InvalidTimestamp` for unknown layouts and
/// `SkipReason::NonexistentLocalTime` for wall-clock times inside a DST gap.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Result<ParsedTime, SkipReason> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(ParsedTime::Instant(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, XMLTV_INPUT_FORMAT) {
        return Ok(ParsedTime::Instant(dt.with_timezone(&Utc)));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return localize(naive, tz).map(ParsedTime::Instant);
        }
    }

    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(ParsedTime::Day)
        .map_err(|_| SkipReason::InvalidTimestamp)
}

/// Converts a wall-clock time in `tz` to UTC.
fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, SkipReason> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(SkipReason::NonexistentLocalTime),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use chrono_tz::Europe::Lisbon;

    use super::*;

    fn instant(raw: &str) -> String {
        match parse_timestamp(raw, Lisbon).unwrap() {
            ParsedTime::Instant(dt) => dt.to_rfc3339(),
            ParsedTime::Day(d) => panic!("expected instant, got day {d}"),
        }
    }

    #[test]
    fn test_parse_rfc3339_keeps_offset() {
        assert_eq!(
            instant("2024-05-01T20:30:00+01:00"),
            "2024-05-01T19:30:00+00:00"
        );
        assert_eq!(instant("2024-05-01T20:30:00Z"), "2024-05-01T20:30:00+00:00");
    }

    #[test]
    fn test_parse_xmltv_layout() {
        assert_eq!(
            instant("20240501203000 +0100"),
            "2024-05-01T19:30:00+00:00"
        );
    }

    #[test]
    fn test_parse_naive_uses_provider_timezone() {
        // Lisbon is UTC+1 in summer, UTC+0 in winter.
        assert_eq!(instant("2024-07-01 21:00:00"), "2024-07-01T20:00:00+00:00");
        assert_eq!(instant("2024-01-15T21:00"), "2024-01-15T21:00:00+00:00");
    }

    #[test]
    fn test_parse_ambiguous_local_time_takes_earlier_instant() {
        // 2024-10-27 01:30 happens twice in Lisbon.
        assert_eq!(instant("2024-10-27 01:30:00"), "2024-10-27T00:30:00+00:00");
    }

    #[test]
    fn test_parse_local_time_in_dst_gap() {
        // 2024-03-31 01:30 does not exist in Lisbon.
        assert_eq!(
            parse_timestamp("2024-03-31 01:30:00", Lisbon),
            Err(SkipReason::NonexistentLocalTime)
        );
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(
            parse_timestamp(" 2024-05-01 ", Lisbon),
            Ok(ParsedTime::Day(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()))
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(
            parse_timestamp("amanhã às 20h", Lisbon),
            Err(SkipReason::InvalidTimestamp)
        );
        assert_eq!(
            parse_timestamp("2024-02-30", Lisbon),
            Err(SkipReason::InvalidTimestamp)
        );
    }
}
