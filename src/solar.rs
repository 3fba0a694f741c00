//! Proleptic Gregorian dates and day arithmetic.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::consts::{
    CENTURY_CYCLE, DAYS_IN_MONTH, DAYS_PER_100_YEARS, DAYS_PER_400_YEARS, DAYS_PER_4_YEARS,
    DAYS_PER_YEAR, FEBRUARY, FEBRUARY_DAYS_LEAP, GREGORIAN_CYCLE, JANUARY, LEAP_YEAR_CYCLE,
    MAX_MONTH, MAX_YEAR, MIN_DAY, MIN_YEAR,
};
use crate::error::{Error, ParseError};
use crate::lunar::DateParts;
use crate::prelude::*;

/// A calendrically valid Gregorian date in `1..=MAX_YEAR`.
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "{:04}-{:02}-{:02}", year, month, day)]
pub struct SolarDate {
    year:  u16,
    month: u8,
    day:   u8,
}

impl SolarDate {
    /// Creates a new date, validating every component.
    ///
    /// # Errors
    /// Returns `Error::InvalidCalendarDate` if the year is outside
    /// `1..=MAX_YEAR`, the month outside `1..=12`, or the day does not exist in
    /// that month (February 29 in a common year, for instance).
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self, Error> {
        let invalid = Error::InvalidCalendarDate { year, month, day };
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || month == 0 || month > MAX_MONTH {
            return Err(invalid);
        }
        if day < MIN_DAY || day > days_in_month(year, month) {
            return Err(invalid);
        }
        Ok(Self { year, month, day })
    }

    /// Returns today's date in the local time zone.
    ///
    /// # Errors
    /// Fails only if the system clock reports a year beyond `MAX_YEAR`.
    pub fn today() -> Result<Self, Error> {
        Self::try_from(chrono::Local::now().date_naive())
    }

    #[inline]
    pub const fn year(self) -> u16 {
        self.year
    }

    #[inline]
    pub const fn month(self) -> u8 {
        self.month
    }

    #[inline]
    pub const fn day(self) -> u8 {
        self.day
    }

    /// Whether this date falls in a Gregorian leap year.
    pub const fn is_leap_year(self) -> bool {
        is_leap_year(self.year)
    }

    /// 1-based day of the year.
    pub const fn ordinal(self) -> u16 {
        ordinal_day(self.year, self.month, self.day)
    }

    /// Days elapsed since 0001-01-01, which is day 0.
    pub const fn day_number(self) -> i64 {
        days_before_year(self.year) + self.ordinal() as i64 - 1
    }

    /// Inverse of [`SolarDate::day_number`].
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if the day number is negative or lands
    /// after 9999-12-31.
    pub fn from_day_number(day_number: i64) -> Result<Self, Error> {
        if day_number < 0 {
            return Err(Error::out_of_range(format!("day number {day_number}")));
        }

        let mut rest = day_number % DAYS_PER_400_YEARS;
        let mut year = (day_number / DAYS_PER_400_YEARS) * i64::from(GREGORIAN_CYCLE) + 1;

        // The last day of a 400-year cycle belongs to the fourth century.
        let centuries = (rest / DAYS_PER_100_YEARS).min(3);
        rest -= centuries * DAYS_PER_100_YEARS;
        year += centuries * i64::from(CENTURY_CYCLE);

        let blocks = rest / DAYS_PER_4_YEARS;
        rest -= blocks * DAYS_PER_4_YEARS;
        year += blocks * i64::from(LEAP_YEAR_CYCLE);

        // Same for the last day of a leap year within its block.
        let years = (rest / DAYS_PER_YEAR).min(3);
        rest -= years * DAYS_PER_YEAR;
        year += years;

        let year = u16::try_from(year)
            .ok()
            .filter(|y| *y <= MAX_YEAR)
            .ok_or_else(|| Error::out_of_range(format!("day number {day_number}")))?;

        let mut month = JANUARY;
        loop {
            let len = i64::from(days_in_month(year, month));
            if rest < len {
                break;
            }
            rest -= len;
            month += 1;
        }
        // `rest` is below the month length here, so it fits in a u8.
        Self::new(year, month, rest as u8 + MIN_DAY)
    }

    /// Shifts the date by a signed number of days.
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if the result leaves `1..=MAX_YEAR`.
    pub fn add_days(self, days: i64) -> Result<Self, Error> {
        let day_number = self
            .day_number()
            .checked_add(days)
            .ok_or_else(|| Error::out_of_range(format!("{self} plus {days} days")))?;
        Self::from_day_number(day_number)
    }

    /// Signed number of days from `self` to `other`.
    pub const fn days_until(self, other: Self) -> i64 {
        other.day_number() - self.day_number()
    }

    /// The following day, or `None` after 9999-12-31.
    pub fn succ(self) -> Option<Self> {
        self.add_days(1).ok()
    }

    /// Same month and day in another year.
    ///
    /// # Errors
    /// Returns `Error::InvalidCalendarDate` when the day does not exist that
    /// year, i.e. February 29 in a common year.
    pub fn with_year(self, year: u16) -> Result<Self, Error> {
        Self::new(year, self.month, self.day)
    }
}

impl FromStr for SolarDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: DateParts = s.parse()?;
        if parts.leap {
            return Err(ParseError::UnexpectedLeapMarker(s.trim().to_owned()).into());
        }
        Self::new(parts.year, parts.month, parts.day)
    }
}

impl TryFrom<NaiveDate> for SolarDate {
    type Error = Error;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        let year = u16::try_from(date.year())
            .map_err(|_| Error::out_of_range(format!("year {}", date.year())))?;
        // chrono months and days are at most 12 and 31.
        Self::new(year, date.month() as u8, date.day() as u8)
    }
}

impl From<SolarDate> for NaiveDate {
    fn from(date: SolarDate) -> Self {
        // Every SolarDate is a valid chrono date; fall back to the minimum to
        // stay total.
        Self::from_ymd_opt(
            i32::from(date.year),
            u32::from(date.month),
            u32::from(date.day),
        )
        .unwrap_or(Self::MIN)
    }
}

impl serde::Serialize for SolarDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for SolarDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// Helper functions

pub const fn is_leap_year(year: u16) -> bool {
    (year % LEAP_YEAR_CYCLE == 0 && year % CENTURY_CYCLE != 0) || (year % GREGORIAN_CYCLE == 0)
}

pub const fn days_in_month(year: u16, month: u8) -> u8 {
    debug_assert!(month != 0 && month <= MAX_MONTH);

    if month == FEBRUARY && is_leap_year(year) {
        FEBRUARY_DAYS_LEAP
    } else {
        DAYS_IN_MONTH[month as usize]
    }
}

/// Days from 0001-01-01 to January 1 of `year`.
const fn days_before_year(year: u16) -> i64 {
    let y = year as i64 - 1;
    y * DAYS_PER_YEAR + y / LEAP_YEAR_CYCLE as i64 - y / CENTURY_CYCLE as i64
        + y / GREGORIAN_CYCLE as i64
}

const fn ordinal_day(year: u16, month: u8, day: u8) -> u16 {
    let mut total = day as u16;
    let mut m = JANUARY;
    while m < month {
        total += days_in_month(year, m) as u16;
        m += 1;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: u16, m: u8, d: u8) -> SolarDate {
        SolarDate::new(y, m, d).unwrap()
    }

    #[test]
    fn test_new_valid() {
        assert!(SolarDate::new(1, 1, 1).is_ok());
        assert!(SolarDate::new(2024, 2, 29).is_ok());
        assert!(SolarDate::new(9999, 12, 31).is_ok());
    }

    #[test]
    fn test_new_invalid() {
        struct TestCase {
            ymd:         (u16, u8, u8),
            description: &'static str,
        }

        let cases = [
            TestCase {
                ymd:         (0, 1, 1),
                description: "year zero",
            },
            TestCase {
                ymd:         (10000, 1, 1),
                description: "year past 9999",
            },
            TestCase {
                ymd:         (2024, 0, 1),
                description: "month zero",
            },
            TestCase {
                ymd:         (2024, 13, 1),
                description: "month 13",
            },
            TestCase {
                ymd:         (2024, 1, 0),
                description: "day zero",
            },
            TestCase {
                ymd:         (2023, 2, 29),
                description: "February 29 in a common year",
            },
            TestCase {
                ymd:         (2024, 2, 30),
                description: "February 30",
            },
            TestCase {
                ymd:         (1900, 2, 29),
                description: "century not divisible by 400",
            },
            TestCase {
                ymd:         (2024, 4, 31),
                description: "April 31",
            },
        ];

        for case in &cases {
            let (y, m, d) = case.ymd;
            assert_eq!(
                SolarDate::new(y, m, d),
                Err(Error::InvalidCalendarDate {
                    year:  y,
                    month: m,
                    day:   d,
                }),
                "{}",
                case.description
            );
        }
    }

    #[test]
    fn test_is_leap_year() {
        for (year, expected) in [
            (2020, true),
            (2021, false),
            (1900, false),
            (2100, false),
            (2000, true),
            (2400, true),
        ] {
            assert_eq!(is_leap_year(year), expected, "year {year}");
        }
    }

    #[test]
    fn test_days_in_month() {
        let expected = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for month in 1..=12 {
            assert_eq!(days_in_month(2023, month), expected[month as usize]);
        }
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2000, 2), 29);
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(date(2023, 1, 1).ordinal(), 1);
        assert_eq!(date(2023, 9, 13).ordinal(), 256);
        assert_eq!(date(2024, 12, 31).ordinal(), 366);
    }

    #[test]
    fn test_day_number_anchors() {
        assert_eq!(date(1, 1, 1).day_number(), 0);
        assert_eq!(date(1, 12, 31).day_number(), 364);
        assert_eq!(date(2, 1, 1).day_number(), 365);
        // 1970-01-01 and 2000-01-01 are 10957 days apart.
        assert_eq!(date(1970, 1, 1).days_until(date(2000, 1, 1)), 10_957);
        assert_eq!(date(1900, 1, 31).days_until(date(2000, 2, 5)), 36_529);
    }

    #[test]
    fn test_from_day_number_cycle_edges() {
        for d in [
            date(1, 1, 1),
            date(4, 12, 31),
            date(100, 12, 31),
            date(101, 1, 1),
            date(400, 12, 31),
            date(401, 1, 1),
            date(1900, 2, 28),
            date(1900, 3, 1),
            date(2000, 2, 29),
            date(2000, 12, 31),
            date(2101, 1, 28),
            date(9999, 12, 31),
        ] {
            assert_eq!(SolarDate::from_day_number(d.day_number()), Ok(d), "{d}");
        }
    }

    #[test]
    fn test_from_day_number_out_of_range() {
        assert!(SolarDate::from_day_number(-1).unwrap_err().is_out_of_range());
        let last = date(9999, 12, 31).day_number();
        assert!(SolarDate::from_day_number(last + 1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_add_days_rollover() {
        assert_eq!(date(2020, 2, 28).add_days(1), Ok(date(2020, 2, 29)));
        assert_eq!(date(2021, 2, 28).add_days(1), Ok(date(2021, 3, 1)));
        assert_eq!(date(2021, 12, 31).add_days(1), Ok(date(2022, 1, 1)));
        assert_eq!(date(2022, 1, 1).add_days(-1), Ok(date(2021, 12, 31)));
        assert_eq!(date(9999, 12, 31).succ(), None);
    }

    #[test]
    fn test_add_days_extreme_offsets() {
        for days in [i64::MAX, i64::MIN, i64::MAX - 1, -1_000_000] {
            assert!(date(2000, 1, 1).add_days(days).unwrap_err().is_out_of_range(), "{days}");
        }
    }

    #[test]
    fn test_with_year() {
        assert_eq!(date(2000, 2, 29).with_year(2004), Ok(date(2004, 2, 29)));
        assert!(date(2000, 2, 29).with_year(2001).is_err());
        assert_eq!(date(2000, 8, 15).with_year(2001), Ok(date(2001, 8, 15)));
    }

    #[test]
    fn test_ordering() {
        assert!(date(1999, 12, 31) < date(2000, 1, 1));
        assert!(date(2000, 1, 31) < date(2000, 2, 1));
        assert!(date(2000, 2, 1) < date(2000, 2, 2));
    }

    #[test]
    fn test_display_and_parse() {
        let d = date(1991, 8, 15);
        assert_eq!(d.to_string(), "1991-08-15");
        assert_eq!(" 1991-08-15 ".parse::<SolarDate>(), Ok(d));
        assert_eq!("0033-01-05".parse::<SolarDate>(), Ok(date(33, 1, 5)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "2021-02-29".parse::<SolarDate>(),
            Err(Error::InvalidCalendarDate { .. })
        ));
        assert!(matches!(
            "2021-L02-01".parse::<SolarDate>(),
            Err(Error::Parse(ParseError::UnexpectedLeapMarker(_)))
        ));
        assert!(matches!("".parse::<SolarDate>(), Err(Error::Parse(ParseError::EmptyInput))));
    }

    #[test]
    fn test_serde() {
        let d = date(2024, 2, 29);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#""2024-02-29""#);
        let parsed: SolarDate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, d);

        let result: Result<SolarDate, _> = serde_json::from_str(r#""2023-02-29""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_chrono_interop() {
        let naive = NaiveDate::from_ymd_opt(2017, 7, 23).unwrap();
        let d = SolarDate::try_from(naive).unwrap();
        assert_eq!(d, date(2017, 7, 23));
        assert_eq!(NaiveDate::from(d), naive);

        let too_early = NaiveDate::from_ymd_opt(-5, 1, 1).unwrap();
        assert!(SolarDate::try_from(too_early).unwrap_err().is_out_of_range());
    }
}
