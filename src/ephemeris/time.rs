//! ISO 8601 parsing and Julian Day conversion

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Julian Day of 1970-01-01T00:00:00 UTC
const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;
const MINUTES_PER_DAY: f64 = 1_440.0;

/// Output format for event timestamps
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A UTC instant with minute resolution, as consumed by the ephemeris engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTime {
    datetime: NaiveDateTime,
    julian_day: f64,
}

impl EventTime {
    /// Build from wall-clock fields taken as UTC; seconds are dropped
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        let datetime = datetime
            .with_second(0)
            .and_then(|dt| dt.with_nanosecond(0))
            .unwrap_or(datetime);

        Self {
            datetime,
            julian_day: datetime_to_julian_day(datetime),
        }
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    /// Julian Day in Universal Time
    pub fn julian_day(&self) -> f64 {
        self.julian_day
    }

    /// `YYYY-MM-DD HH:MM`
    pub fn format_minute(&self) -> String {
        self.datetime.format(MINUTE_FORMAT).to_string()
    }
}

/// Parse an ISO 8601 date or date-time into an [`EventTime`]
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH[:MM[:SS[.fff]]]` (a space may replace
/// the `T`), optionally followed by `Z` or a numeric offset. The offset is
/// validated but not applied: the wall-clock fields are treated as UTC.
pub fn parse_iso_datetime(input: &str) -> Result<EventTime> {
    let invalid = || Error::InvalidDateTime(input.to_string());

    let trimmed = input.trim();
    let date_part = trimmed.get(..10).ok_or_else(invalid)?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())?;

    let rest = &trimmed[10..];
    if rest.is_empty() {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        return Ok(EventTime::from_datetime(midnight));
    }

    let time_part = rest
        .strip_prefix('T')
        .or_else(|| rest.strip_prefix('t'))
        .or_else(|| rest.strip_prefix(' '))
        .ok_or_else(invalid)?;
    let time_part = strip_utc_offset(time_part).ok_or_else(invalid)?;

    // Hour-only times have no minute field for chrono to parse
    let time_part = if time_part.len() == 2 {
        format!("{}:00", time_part)
    } else {
        time_part.to_string()
    };

    let text = format!("{}T{}", date_part, time_part);
    let datetime = NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M"))
        .map_err(|_| invalid())?;

    Ok(EventTime::from_datetime(datetime))
}

/// Remove a trailing `Z`, `±HH`, `±HHMM` or `±HH:MM` from a time string
fn strip_utc_offset(time: &str) -> Option<&str> {
    if let Some(stripped) = time.strip_suffix(['Z', 'z']) {
        return Some(stripped);
    }

    let Some(sign_at) = time.rfind(['+', '-']) else {
        return Some(time);
    };

    let offset = &time[sign_at + 1..];
    let digits: String = offset.chars().filter(|c| *c != ':').collect();
    let well_formed = match offset.len() {
        2 | 4 => offset.chars().all(|c| c.is_ascii_digit()),
        5 => {
            offset.as_bytes()[2] == b':'
                && digits.len() == 4
                && digits.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    };
    if !well_formed {
        return None;
    }

    let hours: u32 = digits[..2].parse().ok()?;
    let minutes: u32 = if digits.len() == 4 {
        digits[2..].parse().ok()?
    } else {
        0
    };
    if hours > 23 || minutes > 59 {
        return None;
    }

    Some(&time[..sign_at])
}

/// Convert a UTC date/time to Julian Day (UT)
pub fn datetime_to_julian_day(datetime: NaiveDateTime) -> f64 {
    UNIX_EPOCH_JULIAN_DAY + datetime.and_utc().timestamp_millis() as f64 / MILLIS_PER_DAY
}

/// Convert a Julian Day (UT) to a UTC date/time, rounded to the nearest minute
pub fn julian_day_to_datetime(julian_day: f64) -> Option<NaiveDateTime> {
    if !julian_day.is_finite() {
        return None;
    }

    let minutes = ((julian_day - UNIX_EPOCH_JULIAN_DAY) * MINUTES_PER_DAY).round();
    let seconds = (minutes as i64).checked_mul(60)?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}
