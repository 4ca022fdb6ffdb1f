//! Timestamp parsing shared by the wire model and date criteria.

use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};

/// Parse an instant written as RFC 3339, `YYYY-MM-DD HH:MM:SS (Zone)`,
/// `YYYY-MM-DDTHH:MM[:SS[.fff]]` with an optional `Z` or numeric offset,
/// or a bare `YYYY-MM-DD`.
///
/// Forms without an offset are read as UTC; a bare date is midnight UTC.
pub fn parse_instant(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(value);
    }

    let bare = trimmed.split(" (").next().unwrap_or(trimmed).trim();
    let with_offset = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]][offset_hour sign:mandatory]:[offset_minute]"
    );
    if let Ok(value) = OffsetDateTime::parse(bare, with_offset) {
        return Some(value);
    }

    let local = bare.strip_suffix(['Z', 'z']).unwrap_or(bare);
    let t_separated = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    if let Ok(value) = PrimitiveDateTime::parse(local, t_separated) {
        return Some(value.assume_utc());
    }
    let spaced = format_description!(
        "[year]-[month]-[day] [hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    if let Ok(value) = PrimitiveDateTime::parse(local, spaced) {
        return Some(value.assume_utc());
    }
    let date_only = format_description!("[year]-[month]-[day]");
    Date::parse(bare, date_only).ok().map(|date| date.midnight().assume_utc())
}

pub fn from_unix(seconds: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds).ok()
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
