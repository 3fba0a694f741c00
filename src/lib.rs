//! Chinese lunar calendar conversion and birthday calendars.
//!
//! Dates between 1900-01-31 (lunar 1900, first month, first day) and
//! 2101-01-28 convert in both directions through a packed year table. On
//! top of the conversion, a [`Birthday`] repeats a date every year in either
//! calendar and the resulting events are written as an iCalendar file.
//!
//! ```
//! use lunar_birthday::{
//!     Birthday, CalendarKind, Converter, IcsCalendar, LunarMonth, RecurrenceOptions, SolarDate,
//! };
//!
//! let converter = Converter::chinese();
//! let born = SolarDate::new(2017, 7, 23).unwrap();
//! let lunar = converter.solar_to_lunar(born).unwrap();
//! assert_eq!(lunar.month(), LunarMonth::Leap(6));
//! assert_eq!(lunar.to_string(), "2017-L06-01");
//!
//! let birthday = Birthday::new("Mei", born, CalendarKind::Lunar);
//! let options = RecurrenceOptions {
//!     years: 10,
//!     ..RecurrenceOptions::default()
//! };
//! let mut calendar = IcsCalendar::new();
//! let skipped = birthday.emit(&converter, &options, &mut calendar).unwrap();
//! assert_eq!((calendar.len(), skipped.len()), (10, 0));
//! ```

mod chinese_data;
mod consts;
mod prelude;

pub mod birthday;
pub mod config;
pub mod convert;
pub mod error;
pub mod ics;
pub mod lunar;
pub mod recurrence;
pub mod solar;
pub mod table;

pub use birthday::{Birthday, BirthdayReport};
pub use config::{BatchConfig, PersonEntry};
pub use consts::*;
pub use convert::Converter;
pub use error::{Error, IcsError, ParseError};
pub use ics::{BirthdayEvent, EventSink, IcsCalendar};
pub use lunar::{DateParts, LunarDate, LunarMonth};
pub use recurrence::{
    Anchor, CalendarKind, Expansion, LeapPolicy, Occurrence, RecurrenceOptions, ShortMonthPolicy,
    Skipped, expand,
};
pub use solar::SolarDate;
pub use table::{LunarTable, LunarYearRecord};
