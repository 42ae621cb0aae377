//! Calendar primitives: wall-clock times of day as minute offsets and ISO dates.
//!
//! Times are local to a single zone resolved upstream, so there is no timezone
//! component here. A day runs from `00:00` to `24:00` (the latter only makes
//! sense as the end of a window).

use std::{fmt, str::FromStr};

use thiserror::Error;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use tracing::warn;

/// Number of minutes in a day; also the largest valid [`MinuteOfDay`].
pub const MINUTES_PER_DAY: u16 = 24 * 60;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Minutes elapsed since midnight, in `0..=1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    /// Midnight at the start of the day.
    pub const MIDNIGHT: Self = Self(0);

    /// Build a minute offset, rejecting values past the end of the day.
    pub const fn new(minutes: u16) -> Option<Self> {
        if minutes <= MINUTES_PER_DAY {
            Some(Self(minutes))
        } else {
            None
        }
    }

    /// Build a minute offset from an hour/minute pair.
    pub const fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if minutes >= 60 {
            return None;
        }
        Self::new(hours * 60 + minutes)
    }

    /// Raw minute offset.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Whether this time falls on a grid of `slot_minutes` wide slots.
    pub fn is_on_grid(self, slot_minutes: u16) -> bool {
        slot_minutes != 0 && self.0 % slot_minutes == 0
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for MinuteOfDay {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        to_minutes(s)
    }
}

/// Failure to interpret an `HH:MM` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Input is not two numeric fields separated by a colon.
    #[error("time `{input}` is not in HH:MM format")]
    Malformed {
        /// Offending input.
        input: String,
    },
    /// Fields are numeric but do not name a time of day.
    #[error("time `{input}` is outside 00:00..=24:00")]
    OutOfRange {
        /// Offending input.
        input: String,
    },
}

/// Parse an `HH:MM` string (single-digit hours accepted) into a minute offset.
pub fn to_minutes(input: &str) -> Result<MinuteOfDay, FormatError> {
    let malformed = || FormatError::Malformed {
        input: input.to_string(),
    };

    let (hours, minutes) = input.trim().split_once(':').ok_or_else(malformed)?;
    if hours.is_empty()
        || hours.len() > 2
        || minutes.len() != 2
        || !hours.bytes().all(|b| b.is_ascii_digit())
        || !minutes.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }

    let hours: u16 = hours.parse().map_err(|_| malformed())?;
    let minutes: u16 = minutes.parse().map_err(|_| malformed())?;

    MinuteOfDay::from_hm(hours, minutes).ok_or_else(|| FormatError::OutOfRange {
        input: input.to_string(),
    })
}

/// Render a minute offset as a zero-padded `HH:MM` string.
pub fn from_minutes(minutes: MinuteOfDay) -> String {
    minutes.to_string()
}

/// Parse a time read back from the store, degrading malformed input to midnight.
///
/// Used on the read path only so a single dirty row cannot abort a matching
/// pass. A zeroed start makes that participant look free from midnight, so
/// the common window can open earlier than their real availability and
/// report an overlap that does not exist. A zeroed end collapses the window.
pub fn to_minutes_or_zero(input: &str) -> MinuteOfDay {
    match to_minutes(input) {
        Ok(minutes) => minutes,
        Err(err) => {
            warn!(error = %err, "malformed stored time; treating as 00:00");
            MinuteOfDay::MIDNIGHT
        }
    }
}

/// Failure to interpret a `YYYY-MM-DD` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("date `{input}` is not a valid YYYY-MM-DD date")]
pub struct DateFormatError {
    /// Offending input.
    pub input: String,
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<Date, DateFormatError> {
    Date::parse(input.trim(), ISO_DATE).map_err(|_| DateFormatError {
        input: input.to_string(),
    })
}

/// Render a date as ISO `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    // Four-digit years always fit the description.
    date.format(ISO_DATE)
        .unwrap_or_else(|_| format!("{}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_zero_padded_times() {
        assert_eq!(to_minutes("00:00").unwrap().get(), 0);
        assert_eq!(to_minutes("17:30").unwrap().get(), 17 * 60 + 30);
        assert_eq!(to_minutes("24:00").unwrap().get(), MINUTES_PER_DAY);
    }

    #[test]
    fn accepts_single_digit_hours_and_whitespace() {
        assert_eq!(to_minutes("9:05").unwrap().get(), 9 * 60 + 5);
        assert_eq!(to_minutes(" 21:00 ").unwrap().get(), 21 * 60);
    }

    #[test]
    fn rejects_malformed_times() {
        for input in ["", "17", "17:0", "17:000", "ab:cd", "17-30", "17:30:00", "-1:00", "+1:00"] {
            assert!(
                matches!(to_minutes(input), Err(FormatError::Malformed { .. })),
                "{input:?} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_times() {
        assert!(matches!(to_minutes("24:30"), Err(FormatError::OutOfRange { .. })));
        assert!(matches!(to_minutes("25:00"), Err(FormatError::OutOfRange { .. })));
        assert!(matches!(to_minutes("12:60"), Err(FormatError::OutOfRange { .. })));
    }

    #[test]
    fn minutes_round_trip_for_every_half_hour() {
        for m in (0..=MINUTES_PER_DAY).step_by(30) {
            let minute = MinuteOfDay::new(m).unwrap();
            let text = from_minutes(minute);
            assert_eq!(to_minutes(&text).unwrap(), minute);
            assert_eq!(from_minutes(to_minutes(&text).unwrap()), text);
        }
    }

    #[test]
    fn lenient_parse_degrades_to_midnight() {
        assert_eq!(to_minutes_or_zero("garbage"), MinuteOfDay::MIDNIGHT);
        assert_eq!(to_minutes_or_zero("19:30").get(), 19 * 60 + 30);
    }

    #[test]
    fn grid_check() {
        assert!(MinuteOfDay::from_hm(17, 30).unwrap().is_on_grid(30));
        assert!(!MinuteOfDay::from_hm(17, 15).unwrap().is_on_grid(30));
        assert!(!MinuteOfDay::from_hm(17, 0).unwrap().is_on_grid(0));
    }

    #[test]
    fn iso_dates() {
        assert_eq!(parse_date("2026-02-10").unwrap(), date!(2026 - 02 - 10));
        assert_eq!(format_date(date!(2026 - 02 - 03)), "2026-02-03");
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("10/02/2026").is_err());
    }
}
