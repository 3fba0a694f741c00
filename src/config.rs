//! TOML batch file listing several people.
//!
//! ```toml
//! output = "family.ics"
//! years = 80
//!
//! [[person]]
//! name = "Mei"
//! calendar = "lunar"
//! date = "1990-L05-10"
//!
//! [[person]]
//! name = "Jun"
//! calendar = "solar"
//! follow = "lunar"
//! date = "2000-01-01"
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::birthday::Birthday;
use crate::consts::DEFAULT_RECURRENCE_YEARS;
use crate::error::Error;
use crate::lunar::DateParts;
use crate::recurrence::{Anchor, CalendarKind, LeapPolicy, RecurrenceOptions, ShortMonthPolicy};
use crate::table::LunarTable;

/// Top-level batch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Calendar file to write; the command line may override it.
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default = "default_years")]
    pub years: u16,

    #[serde(default)]
    pub start_year: Option<u16>,

    #[serde(default)]
    pub leap_policy: LeapPolicy,

    #[serde(default)]
    pub short_month: ShortMonthPolicy,

    #[serde(default, rename = "person")]
    pub people: Vec<PersonEntry>,
}

const fn default_years() -> u16 {
    DEFAULT_RECURRENCE_YEARS
}

/// One `[[person]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonEntry {
    pub name: String,

    /// Calendar `date` is written in.
    pub calendar: CalendarKind,

    /// Calendar the reminder follows; defaults to `calendar`.
    #[serde(default)]
    pub follow: Option<CalendarKind>,

    pub date: DateParts,

    /// Marks a lunar leap month, same as an `L` before the month.
    #[serde(default)]
    pub leap: bool,
}

impl BatchConfig {
    /// Parses a batch file.
    ///
    /// # Errors
    /// Any TOML syntax or schema error.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub const fn recurrence(&self) -> RecurrenceOptions {
        RecurrenceOptions {
            years:       self.years,
            start_year:  self.start_year,
            leap_policy: self.leap_policy,
            short_month: self.short_month,
        }
    }
}

impl PersonEntry {
    pub fn follow(&self) -> CalendarKind {
        self.follow.unwrap_or(self.calendar)
    }

    /// Validates the entry's date against `table`.
    ///
    /// # Errors
    /// The errors of [`Anchor::from_parts`].
    pub fn birthday(&self, table: &LunarTable) -> Result<Birthday, Error> {
        let parts = DateParts {
            leap: self.date.leap || self.leap,
            ..self.date
        };
        let anchor = Anchor::from_parts(table, self.calendar, parts)?;
        Ok(Birthday::new(self.name.clone(), anchor, self.follow()))
    }
}
