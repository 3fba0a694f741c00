//! Birthdays and the reminder events generated for them.

use tracing::debug;

use crate::convert::Converter;
use crate::error::Error;
use crate::ics::{BirthdayEvent, EventSink};
use crate::recurrence::{Anchor, CalendarKind, RecurrenceOptions, Skipped, expand};

/// A person's birthday and the calendar its reminders follow.
///
/// `date` may be given in either calendar. When it differs from `follow`, it
/// is converted first: a solar birth date followed in the lunar calendar
/// repeats the lunar month and day it fell on, and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Birthday {
    pub name:   String,
    pub date:   Anchor,
    pub follow: CalendarKind,
}

/// Events produced for one birthday, plus the years that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BirthdayReport {
    pub events:  Vec<BirthdayEvent>,
    pub skipped: Vec<Skipped>,
}

impl Birthday {
    pub fn new(name: impl Into<String>, date: impl Into<Anchor>, follow: CalendarKind) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            follow,
        }
    }

    /// Event title, e.g. `Mei's Lunar Birthday`.
    pub fn title(&self) -> String {
        format!("{}'s {} Birthday", self.name, self.follow)
    }

    /// The birth date expressed in the followed calendar.
    ///
    /// # Errors
    /// Conversion errors when the calendars differ.
    pub fn anchor(&self, converter: &Converter<'_>) -> Result<Anchor, Error> {
        self.date.to_calendar(converter, self.follow)
    }

    /// Builds one all-day event per recurring year.
    ///
    /// # Errors
    /// Fails if the birth date cannot be converted into the followed calendar,
    /// or if every requested year is out of range.
    pub fn events(
        &self,
        converter: &Converter<'_>,
        options: &RecurrenceOptions,
    ) -> Result<BirthdayReport, Error> {
        let anchor = self.anchor(converter)?;
        debug!(name = %self.name, %anchor, "expanding birthday");
        let expansion = expand(converter, anchor, options)?;
        let title = self.title();
        Ok(BirthdayReport {
            events:  expansion
                .dates()
                .map(|date| BirthdayEvent::new(title.clone(), date))
                .collect(),
            skipped: expansion.skipped,
        })
    }

    /// Sends this birthday's events to `sink` and returns the skipped years.
    ///
    /// # Errors
    /// Same as [`Birthday::events`]; nothing is sent on error.
    pub fn emit(
        &self,
        converter: &Converter<'_>,
        options: &RecurrenceOptions,
        sink: &mut impl EventSink,
    ) -> Result<Vec<Skipped>, Error> {
        let report = self.events(converter, options)?;
        sink.extend_events(report.events);
        Ok(report.skipped)
    }
}
