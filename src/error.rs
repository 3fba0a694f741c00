//! Error types for conversion, parsing, and calendar-file handling.

use crate::lunar::LunarMonth;
use crate::prelude::*;

/// Failure to read the text form of a date.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ParseError {
    #[display(fmt = "Invalid date format: {_0}")]
    InvalidFormat(String),
    #[display(fmt = "Invalid number in date: {_0}")]
    InvalidNumber(String),
    #[display(fmt = "Leap month marker is only valid for lunar dates: {_0}")]
    UnexpectedLeapMarker(String),
    #[display(fmt = "Unknown calendar: {_0} (expected solar or lunar)")]
    UnknownCalendar(String),
    #[display(fmt = "Empty date string")]
    EmptyInput,
}

impl std::error::Error for ParseError {}

/// Error type for every fallible calendar operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The date or lunar year lies outside the span covered by the table.
    #[error("{subject} is outside the supported range")]
    OutOfRange { subject: String },

    /// A leap month was requested for a year that does not have it.
    #[error("lunar year {year} has no leap month {month}")]
    InvalidLeapMonth { year: u16, month: u8 },

    /// The day exceeds the recorded length of the lunar month.
    #[error("invalid day {day} for lunar {year} month {month} (max {max})")]
    InvalidDay {
        year:  u16,
        month: LunarMonth,
        day:   u8,
        max:   u8,
    },

    /// Month number outside `1..=12`.
    #[error("invalid month: {month} (must be 1-12)")]
    InvalidMonth { month: u8 },

    /// Not a real date in the Gregorian calendar.
    #[error("{year:04}-{month:02}-{day:02} is not a valid Gregorian date")]
    InvalidCalendarDate { year: u16, month: u8, day: u8 },

    /// A custom lunar table failed validation.
    #[error("invalid lunar table: {0}")]
    InvalidTable(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    pub(crate) fn out_of_range(subject: impl std::fmt::Display) -> Self {
        Self::OutOfRange {
            subject: subject.to_string(),
        }
    }

    /// Returns `true` for [`Error::OutOfRange`].
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

/// Errors raised while writing or reading iCalendar files.
#[derive(Debug, thiserror::Error)]
pub enum IcsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed calendar at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidLeapMonth { year: 2000, month: 1 };
        assert_eq!(err.to_string(), "lunar year 2000 has no leap month 1");

        let err = Error::InvalidDay {
            year:  2017,
            month: LunarMonth::Ordinary(6),
            day:   30,
            max:   29,
        };
        assert_eq!(err.to_string(), "invalid day 30 for lunar 2017 month 6 (max 29)");

        let err = Error::InvalidCalendarDate {
            year:  2023,
            month: 2,
            day:   30,
        };
        assert_eq!(err.to_string(), "2023-02-30 is not a valid Gregorian date");

        let err = Error::out_of_range("lunar year 2101");
        assert_eq!(err.to_string(), "lunar year 2101 is outside the supported range");
        assert!(err.is_out_of_range());
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err: Error = ParseError::EmptyInput.into();
        assert_eq!(err.to_string(), "Empty date string");
        assert!(!err.is_out_of_range());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<Error>();
        assert_impl::<ParseError>();
        assert_impl::<IcsError>();
    }
}
