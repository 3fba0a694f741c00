//! Conversion between solar and lunar dates.

use tracing::debug;

use crate::error::Error;
use crate::lunar::{LunarDate, LunarMonth};
use crate::solar::SolarDate;
use crate::table::LunarTable;

/// Converts dates in both directions using a borrowed [`LunarTable`].
///
/// Conversions are pure; a converter is cheap to copy and share between
/// threads.
///
/// # Examples
///
/// ```
/// use lunar_birthday::{Converter, LunarMonth, SolarDate};
///
/// let converter = Converter::chinese();
/// let solar = SolarDate::new(2000, 1, 1).unwrap();
/// let lunar = converter.solar_to_lunar(solar).unwrap();
///
/// assert_eq!((1999, LunarMonth::Ordinary(11), 25), (lunar.year(), lunar.month(), lunar.day()));
/// assert_eq!(converter.lunar_to_solar(lunar), Ok(solar));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Converter<'t> {
    table: &'t LunarTable,
}

impl Converter<'static> {
    /// Converter over the bundled Chinese table (1900 to 2100).
    pub fn chinese() -> Self {
        Self::new(LunarTable::chinese())
    }
}

impl Default for Converter<'static> {
    fn default() -> Self {
        Self::chinese()
    }
}

impl<'t> Converter<'t> {
    pub const fn new(table: &'t LunarTable) -> Self {
        Self { table }
    }

    pub const fn table(&self) -> &'t LunarTable {
        self.table
    }

    /// Day offset of `date` from the table's epoch.
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if `date` falls outside the table.
    pub fn offset_of(&self, date: SolarDate) -> Result<i64, Error> {
        let offset = self.table.epoch().days_until(date);
        if offset < 0 || offset >= self.table.total_days() {
            return Err(Error::out_of_range(format!("solar date {date}")));
        }
        Ok(offset)
    }

    /// Finds the lunar date that falls on `date`.
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if `date` is before the epoch or after the
    /// last day of the table.
    pub fn solar_to_lunar(&self, date: SolarDate) -> Result<LunarDate, Error> {
        let offset = self.offset_of(date)?;
        let (record, mut rest) = self
            .table
            .locate(offset)
            .ok_or_else(|| Error::out_of_range(format!("solar date {date}")))?;

        for (month, len) in record.months() {
            let len = i64::from(len);
            if rest < len {
                // `rest` is below the month length, so it fits in a u8.
                let lunar = LunarDate::new(self.table, record.year(), month, rest as u8 + 1)?;
                debug!(%date, %lunar, "solar to lunar");
                return Ok(lunar);
            }
            rest -= len;
        }
        Err(Error::out_of_range(format!("solar date {date}")))
    }

    /// Finds the solar date of `date`.
    ///
    /// The lunar date is validated again against this converter's table, so
    /// dates built from another table are rejected rather than misplaced.
    ///
    /// # Errors
    /// - `Error::OutOfRange` if the table does not cover the lunar year
    /// - `Error::InvalidLeapMonth` if the year has no such leap month
    /// - `Error::InvalidDay` if the day exceeds the month length
    pub fn lunar_to_solar(&self, date: LunarDate) -> Result<SolarDate, Error> {
        let record = self.table.lookup(date.year())?;
        let slot = record.slot(date.month())?;
        let max = record.month_lengths()[slot];
        if date.day() > max {
            return Err(Error::InvalidDay {
                year: date.year(),
                month: date.month(),
                day: date.day(),
                max,
            });
        }

        let months_before: i64 = record.month_lengths()[..slot]
            .iter()
            .copied()
            .map(i64::from)
            .sum();
        let offset = self.table.year_start(date.year())? + months_before + i64::from(date.day()) - 1;
        let solar = self.table.epoch().add_days(offset)?;
        debug!(lunar = %date, %solar, "lunar to solar");
        Ok(solar)
    }

    /// Builds and converts a lunar date from raw components.
    ///
    /// # Errors
    /// `Error::InvalidMonth` for a month outside `1..=12`, otherwise the
    /// errors of [`LunarDate::new`].
    pub fn lunar_parts_to_solar(
        &self,
        year: u16,
        month: u8,
        day: u8,
        is_leap: bool,
    ) -> Result<SolarDate, Error> {
        let month = LunarMonth::new(month, is_leap)?;
        let date = LunarDate::new(self.table, year, month, day)?;
        self.lunar_to_solar(date)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::table::LunarYearRecord;

    fn solar(y: u16, m: u8, d: u8) -> SolarDate {
        SolarDate::new(y, m, d).unwrap()
    }

    fn lunar(y: u16, month: LunarMonth, d: u8) -> LunarDate {
        LunarDate::new(LunarTable::chinese(), y, month, d).unwrap()
    }

    #[test]
    fn test_golden_vectors() {
        use LunarMonth::*;
        let converter = Converter::chinese();
        let cases = [
            ((2000, 1, 1), (1999, Ordinary(11), 25)),
            ((2000, 2, 5), (2000, Ordinary(1), 1)),
            ((1900, 1, 31), (1900, Ordinary(1), 1)),
            ((2017, 1, 28), (2017, Ordinary(1), 1)),
            ((2017, 7, 22), (2017, Ordinary(6), 29)),
            ((2017, 7, 23), (2017, Leap(6), 1)),
            ((2017, 8, 22), (2017, Ordinary(7), 1)),
            ((1990, 6, 23), (1990, Leap(5), 1)),
            ((2023, 3, 22), (2023, Leap(2), 1)),
            ((2023, 4, 20), (2023, Ordinary(3), 1)),
            ((2024, 2, 10), (2024, Ordinary(1), 1)),
            ((2101, 1, 28), (2100, Ordinary(12), 29)),
        ];
        for ((y, m, d), (ly, lm, ld)) in cases {
            let s = solar(y, m, d);
            let l = lunar(ly, lm, ld);
            assert_eq!(converter.solar_to_lunar(s), Ok(l), "{s}");
            assert_eq!(converter.lunar_to_solar(l), Ok(s), "{l}");
        }
    }

    #[test]
    fn test_solar_out_of_range() {
        let converter = Converter::chinese();
        for s in [solar(1900, 1, 30), solar(1, 1, 1), solar(2101, 1, 29), solar(9999, 12, 31)] {
            assert!(converter.solar_to_lunar(s).unwrap_err().is_out_of_range(), "{s}");
        }
    }

    #[test]
    fn test_lunar_parts_rejections() {
        let converter = Converter::chinese();
        assert_eq!(
            converter.lunar_parts_to_solar(2000, 1, 1, true),
            Err(Error::InvalidLeapMonth { year: 2000, month: 1 })
        );
        assert_eq!(
            converter.lunar_parts_to_solar(2017, 7, 1, true),
            Err(Error::InvalidLeapMonth { year: 2017, month: 7 })
        );
        assert_eq!(
            converter.lunar_parts_to_solar(2017, 6, 30, false),
            Err(Error::InvalidDay {
                year:  2017,
                month: LunarMonth::Ordinary(6),
                day:   30,
                max:   29,
            })
        );
        assert_eq!(
            converter.lunar_parts_to_solar(2017, 13, 1, false),
            Err(Error::InvalidMonth { month: 13 })
        );
        assert!(converter
            .lunar_parts_to_solar(2101, 1, 1, false)
            .unwrap_err()
            .is_out_of_range());
        assert_eq!(converter.lunar_parts_to_solar(2017, 6, 30, true), Ok(solar(2017, 8, 21)));
    }

    #[test]
    fn test_foreign_table_dates_are_revalidated() {
        // A table where lunar year 2000 has a leap first month.
        let epoch = solar(2000, 2, 5);
        let records = vec![LunarYearRecord::new(2000, vec![30; 13], Some(1)).unwrap()];
        let custom = LunarTable::new(epoch, records).unwrap();
        let date = LunarDate::new(&custom, 2000, LunarMonth::Leap(1), 30).unwrap();

        assert_eq!(Converter::new(&custom).lunar_to_solar(date), Ok(solar(2000, 4, 4)));
        assert_eq!(
            Converter::chinese().lunar_to_solar(date),
            Err(Error::InvalidLeapMonth { year: 2000, month: 1 })
        );
    }

    #[test]
    fn test_whole_table_round_trip() {
        let converter = Converter::chinese();
        let table = converter.table();
        let mut date = table.epoch();
        let mut previous: Option<LunarDate> = None;
        loop {
            let l = converter.solar_to_lunar(date).unwrap();
            assert_eq!(converter.lunar_to_solar(l), Ok(date));
            if let Some(p) = previous {
                assert!(p < l, "{p} then {l}");
            }
            previous = Some(l);
            if date == table.last_date() {
                break;
            }
            date = date.succ().unwrap();
        }
    }

    #[test]
    fn test_every_lunar_day_round_trips() {
        let converter = Converter::chinese();
        for record in converter.table().records() {
            for (month, len) in record.months() {
                for day in 1..=len {
                    let l = lunar(record.year(), month, day);
                    let s = converter.lunar_to_solar(l).unwrap();
                    assert_eq!(converter.solar_to_lunar(s), Ok(l));
                }
            }
        }
    }

    fn solar_in_table() -> impl Strategy<Value = SolarDate> {
        let table = LunarTable::chinese();
        (0..table.total_days()).prop_map(move |offset| table.epoch().add_days(offset).unwrap())
    }

    proptest! {
        #[test]
        fn prop_solar_round_trip(date in solar_in_table()) {
            let converter = Converter::chinese();
            let l = converter.solar_to_lunar(date).unwrap();
            prop_assert_eq!(converter.lunar_to_solar(l), Ok(date));
        }

        #[test]
        fn prop_offsets_are_monotonic(a in solar_in_table(), b in solar_in_table()) {
            let converter = Converter::chinese();
            let (a, b) = if a <= b { (a, b) } else { (b, a) };
            let oa = converter.offset_of(a).unwrap();
            let ob = converter.offset_of(b).unwrap();
            prop_assert_eq!(a < b, oa < ob);
            let la = converter.solar_to_lunar(a).unwrap();
            let lb = converter.solar_to_lunar(b).unwrap();
            prop_assert_eq!(a < b, la < lb);
        }
    }
}
