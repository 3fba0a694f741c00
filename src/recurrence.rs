//! Annual recurrence of a date in either calendar.
//!
//! An [`Anchor`] fixes the month and day to repeat, in the calendar the
//! reminder follows. [`expand`] walks the requested years and re-derives the
//! solar date for each one; a year that has no such date is reported in
//! [`Expansion::skipped`] instead of failing the whole run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::{DEFAULT_RECURRENCE_YEARS, MAX_YEAR};
use crate::convert::Converter;
use crate::error::{Error, ParseError};
use crate::lunar::{DateParts, LunarDate, LunarMonth};
use crate::prelude::*;
use crate::solar::{SolarDate, days_in_month};
use crate::table::LunarTable;

/// The two calendars a birthday can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarKind {
    Solar,
    Lunar,
}

impl fmt::Display for CalendarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Solar => "Solar",
            Self::Lunar => "Lunar",
        })
    }
}

impl FromStr for CalendarKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solar" | "gregorian" => Ok(Self::Solar),
            "lunar" | "chinese" => Ok(Self::Lunar),
            _ => Err(ParseError::UnknownCalendar(s.to_owned())),
        }
    }
}

/// A date whose month and day recur every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub enum Anchor {
    Solar(SolarDate),
    Lunar(LunarDate),
}

impl Anchor {
    /// Validates user-entered components as a date in `kind`.
    ///
    /// # Errors
    /// - `ParseError::UnexpectedLeapMarker` for a solar date marked leap
    /// - the validation errors of [`SolarDate::new`] or [`LunarDate::new`]
    pub fn from_parts(table: &LunarTable, kind: CalendarKind, parts: DateParts) -> Result<Self, Error> {
        match kind {
            CalendarKind::Solar if parts.leap => Err(ParseError::UnexpectedLeapMarker(format!(
                "{:04}-L{:02}-{:02}",
                parts.year, parts.month, parts.day
            ))
            .into()),
            CalendarKind::Solar => SolarDate::new(parts.year, parts.month, parts.day).map(Self::Solar),
            CalendarKind::Lunar => LunarDate::from_parts(table, parts).map(Self::Lunar),
        }
    }

    pub const fn kind(self) -> CalendarKind {
        match self {
            Self::Solar(_) => CalendarKind::Solar,
            Self::Lunar(_) => CalendarKind::Lunar,
        }
    }

    /// Year of the anchor in its own calendar.
    pub const fn year(self) -> u16 {
        match self {
            Self::Solar(date) => date.year(),
            Self::Lunar(date) => date.year(),
        }
    }

    /// Re-expresses the anchor in `kind`, converting when the calendars differ.
    ///
    /// # Errors
    /// Conversion errors from [`Converter`].
    pub fn to_calendar(self, converter: &Converter<'_>, kind: CalendarKind) -> Result<Self, Error> {
        match (self, kind) {
            (Self::Solar(_), CalendarKind::Solar) | (Self::Lunar(_), CalendarKind::Lunar) => Ok(self),
            (Self::Solar(date), CalendarKind::Lunar) => converter.solar_to_lunar(date).map(Self::Lunar),
            (Self::Lunar(date), CalendarKind::Solar) => converter.lunar_to_solar(date).map(Self::Solar),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solar(date) => write!(f, "solar {date}"),
            Self::Lunar(date) => write!(f, "lunar {date}"),
        }
    }
}

/// What to do with a leap-month anchor in years without that leap month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapPolicy {
    /// Only years repeating the same leap month produce a date.
    Exact,
    /// Other years use the ordinary month with the same number.
    #[default]
    OrdinaryFallback,
}

/// What to do when the anchor's day does not exist in a given year.
///
/// Covers lunar day 30 in a 29-day month and February 29 in common years.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortMonthPolicy {
    /// The year is skipped.
    #[default]
    Skip,
    /// The last day of the month is used instead.
    LastDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceOptions {
    /// Number of consecutive years to generate.
    pub years:       u16,
    /// First year, in the anchor's calendar; `None` starts at the anchor's
    /// own year.
    pub start_year:  Option<u16>,
    pub leap_policy: LeapPolicy,
    pub short_month: ShortMonthPolicy,
}

impl Default for RecurrenceOptions {
    fn default() -> Self {
        Self {
            years:       DEFAULT_RECURRENCE_YEARS,
            start_year:  None,
            leap_policy: LeapPolicy::default(),
            short_month: ShortMonthPolicy::default(),
        }
    }
}

/// The solar date of the anchor in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Occurrence {
    /// Year in the anchor's calendar.
    pub year: u16,
    pub date: SolarDate,
}

/// A year that produced no date, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub year:   u16,
    pub reason: Error,
}

/// Result of [`expand`]: occurrences in chronological order plus the skipped
/// years.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub occurrences: Vec<Occurrence>,
    pub skipped:     Vec<Skipped>,
}

impl Expansion {
    pub fn dates(&self) -> impl Iterator<Item = SolarDate> + '_ {
        self.occurrences.iter().map(|o| o.date)
    }
}

/// Expands `anchor` over the years requested in `options`.
///
/// Each year is independent: a year without a matching date is recorded in
/// [`Expansion::skipped`] and logged.
///
/// # Errors
/// Returns `Error::OutOfRange` only when every requested year fell outside
/// the supported range.
pub fn expand(
    converter: &Converter<'_>,
    anchor: Anchor,
    options: &RecurrenceOptions,
) -> Result<Expansion, Error> {
    let start = options.start_year.unwrap_or_else(|| anchor.year());
    let end = start.saturating_add(options.years);

    let mut expansion = Expansion::default();
    for year in start..end {
        let result = match anchor {
            Anchor::Solar(date) => solar_in_year(date, year, options),
            Anchor::Lunar(date) => lunar_in_year(converter, date, year, options),
        };
        match result {
            Ok(date) => expansion.occurrences.push(Occurrence { year, date }),
            Err(reason) => {
                warn!(%anchor, year, %reason, "skipping year");
                expansion.skipped.push(Skipped { year, reason });
            }
        }
    }

    if expansion.occurrences.is_empty()
        && !expansion.skipped.is_empty()
        && expansion.skipped.iter().all(|s| s.reason.is_out_of_range())
    {
        return Err(Error::out_of_range(format!("every year from {start} to {}", end - 1)));
    }

    expansion.occurrences.sort_by_key(|o| o.date);
    info!(
        %anchor,
        occurrences = expansion.occurrences.len(),
        skipped = expansion.skipped.len(),
        "expanded recurrence"
    );
    Ok(expansion)
}

fn solar_in_year(anchor: SolarDate, year: u16, options: &RecurrenceOptions) -> Result<SolarDate, Error> {
    if year > MAX_YEAR {
        return Err(Error::out_of_range(format!("solar year {year}")));
    }
    match (anchor.with_year(year), options.short_month) {
        (Err(Error::InvalidCalendarDate { .. }), ShortMonthPolicy::LastDay) => {
            SolarDate::new(year, anchor.month(), days_in_month(year, anchor.month()))
        }
        (result, _) => result,
    }
}

fn lunar_in_year(
    converter: &Converter<'_>,
    anchor: LunarDate,
    year: u16,
    options: &RecurrenceOptions,
) -> Result<SolarDate, Error> {
    let table = converter.table();
    let record = table.lookup(year)?;

    let month = match (anchor.month(), options.leap_policy) {
        (LunarMonth::Leap(n), LeapPolicy::OrdinaryFallback) if record.leap_month() != Some(n) => {
            LunarMonth::Ordinary(n)
        }
        (month, _) => month,
    };
    let max = record.days_in_month(month)?;
    let day = match options.short_month {
        ShortMonthPolicy::LastDay => anchor.day().min(max),
        ShortMonthPolicy::Skip => anchor.day(),
    };

    let date = LunarDate::new(table, year, month, day)?;
    converter.lunar_to_solar(date)
}
