use crate::media::{Episode, Movie, RecordType, Show};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Raised when a record union cannot be built from its wire shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Unknown record type tag: {0}")]
    UnknownTag(String),

    #[error("Record has no recognisable {0} payload")]
    Empty(&'static str),

    #[error("Record populates more than one {0} shape")]
    Ambiguous(&'static str),

    #[error("Record tagged '{tag}' but carries a {found} payload")]
    TagMismatch { tag: String, found: &'static str },

    #[error("Rating {0} is outside 1-10")]
    RatingOutOfRange(u8),
}

/// Uniform read-only view over every record union.
///
/// The filter engine only talks to records through this trait, so it never
/// has to know which union it is looking at.
pub trait MediaRecord {
    fn record_type(&self) -> RecordType;

    fn movie(&self) -> Option<&Movie> {
        None
    }

    fn show(&self) -> Option<&Show> {
        None
    }

    fn episode(&self) -> Option<&Episode> {
        None
    }

    /// The user's own rating for ratings records.
    fn own_rating(&self) -> Option<f64> {
        None
    }

    fn watched_at(&self) -> Option<&str> {
        None
    }

    fn last_watched_at(&self) -> Option<&str> {
        None
    }

    fn collected_at(&self) -> Option<&str> {
        None
    }
}

/// Parse an API timestamp. Accepts RFC 3339 and bare `YYYY-MM-DD` dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T12:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-05"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
