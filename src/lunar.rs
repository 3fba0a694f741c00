//! Lunar dates and the text form shared by both calendars.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{DATE_SEPARATOR, LEAP_MONTH_PREFIX, MAX_MONTH, MIN_DAY};
use crate::error::{Error, ParseError};
use crate::table::LunarTable;

/// A lunar month name: an ordinary month, or the leap month that follows the
/// ordinary month of the same number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LunarMonth {
    Ordinary(u8),
    Leap(u8),
}

impl LunarMonth {
    /// Builds a month from its number and leap flag.
    ///
    /// # Errors
    /// Returns `Error::InvalidMonth` if `number` is outside `1..=12`.
    pub fn new(number: u8, is_leap: bool) -> Result<Self, Error> {
        if number == 0 || number > MAX_MONTH {
            return Err(Error::InvalidMonth { month: number });
        }
        Ok(if is_leap {
            Self::Leap(number)
        } else {
            Self::Ordinary(number)
        })
    }

    /// Month number, whether leap or not.
    pub const fn number(self) -> u8 {
        match self {
            Self::Ordinary(n) | Self::Leap(n) => n,
        }
    }

    pub const fn is_leap(self) -> bool {
        matches!(self, Self::Leap(_))
    }

    /// The ordinary month sharing this month's number.
    pub const fn ordinary(self) -> Self {
        Self::Ordinary(self.number())
    }
}

impl PartialOrd for LunarMonth {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LunarMonth {
    fn cmp(&self, other: &Self) -> Ordering {
        // A leap month comes right after its ordinary month.
        (self.number(), self.is_leap()).cmp(&(other.number(), other.is_leap()))
    }
}

impl fmt::Display for LunarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinary(n) => write!(f, "{n}"),
            Self::Leap(n) => write!(f, "leap {n}"),
        }
    }
}

/// A date in the Chinese lunisolar calendar, validated against a
/// [`LunarTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LunarDate {
    year:  u16,
    month: LunarMonth,
    day:   u8,
}

impl LunarDate {
    /// Creates a lunar date that exists in `table`.
    ///
    /// # Errors
    /// - `Error::OutOfRange` if the table has no record for `year`
    /// - `Error::InvalidMonth` if the month number is outside `1..=12`
    /// - `Error::InvalidLeapMonth` if `month` is a leap month the year lacks
    /// - `Error::InvalidDay` if `day` is zero or past the end of the month
    pub fn new(table: &LunarTable, year: u16, month: LunarMonth, day: u8) -> Result<Self, Error> {
        let max = table.lookup(year)?.days_in_month(month)?;
        if day < MIN_DAY || day > max {
            return Err(Error::InvalidDay {
                year,
                month,
                day,
                max,
            });
        }
        Ok(Self { year, month, day })
    }

    /// Creates a lunar date from its text components.
    ///
    /// # Errors
    /// Same as [`LunarDate::new`].
    pub fn from_parts(table: &LunarTable, parts: DateParts) -> Result<Self, Error> {
        let month = LunarMonth::new(parts.month, parts.leap)?;
        Self::new(table, parts.year, month, parts.day)
    }

    #[inline]
    pub const fn year(self) -> u16 {
        self.year
    }

    #[inline]
    pub const fn month(self) -> LunarMonth {
        self.month
    }

    #[inline]
    pub const fn day(self) -> u8 {
        self.day
    }

    #[inline]
    pub const fn is_leap_month(self) -> bool {
        self.month.is_leap()
    }
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.month.is_leap() { "L" } else { "" };
        write!(
            f,
            "{:04}-{marker}{:02}-{:02}",
            self.year,
            self.month.number(),
            self.day
        )
    }
}

impl Serialize for LunarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Unvalidated `year-month-day` components, as typed by a user.
///
/// Accepts `YYYY-MM-DD`, and `YYYY-LMM-DD` for a lunar leap month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateParts {
    pub year:  u16,
    pub month: u8,
    pub day:   u8,
    pub leap:  bool,
}

impl DateParts {
    /// Helper to parse u16 with better error messages
    fn parse_u16(s: &str) -> Result<u16, ParseError> {
        s.parse::<u16>()
            .map_err(|_| ParseError::InvalidNumber(s.to_owned()))
    }

    /// Helper to parse u8 with better error messages
    fn parse_u8(s: &str) -> Result<u8, ParseError> {
        s.parse::<u8>()
            .map_err(|_| ParseError::InvalidNumber(s.to_owned()))
    }
}

impl FromStr for DateParts {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let parts: Vec<&str> = trimmed.split(DATE_SEPARATOR).map(str::trim).collect();
        let [year, month, day] = parts.as_slice() else {
            return Err(ParseError::InvalidFormat(format!(
                "expected YYYY{DATE_SEPARATOR}MM{DATE_SEPARATOR}DD, found {} components in {trimmed}",
                parts.len()
            )));
        };

        let (leap, month) = match month.strip_prefix([LEAP_MONTH_PREFIX, 'l']) {
            Some(rest) => (true, rest),
            None => (false, *month),
        };

        Ok(Self {
            year: Self::parse_u16(year)?,
            month: Self::parse_u8(month)?,
            day: Self::parse_u8(day)?,
            leap,
        })
    }
}

impl<'de> Deserialize<'de> for DateParts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
