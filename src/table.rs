//! Lunar calendar table: month lengths and leap months per lunar year.

use std::sync::OnceLock;

use crate::chinese_data::CHINESE_YEAR_DATA;
use crate::consts::{
    LONG_LUNAR_MONTH, LUNAR_EPOCH, MAX_LUNAR_MONTHS, MAX_MONTH, MIN_LUNAR_YEAR, SHORT_LUNAR_MONTH,
};
use crate::error::Error;
use crate::lunar::LunarMonth;
use crate::solar::SolarDate;

/// Low nibble: month number followed by the leap month.
const LEAP_MONTH_MASK: u32 = 0xf;
/// Bit set when the leap month is long; month `n` uses this bit shifted right by `n`.
const LONG_MONTH_BIT: u32 = 0x1_0000;

/// Month layout of a single lunar year.
///
/// `month_lengths` lists the months in calendar order, with the leap month
/// directly after the ordinary month of the same number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunarYearRecord {
    year:          u16,
    month_lengths: Vec<u8>,
    leap_month:    Option<u8>,
}

impl LunarYearRecord {
    /// Creates a record, checking that it describes a well-formed year.
    ///
    /// # Errors
    /// Returns `Error::InvalidTable` if a length is not 29 or 30, the leap
    /// month number is outside `1..=12`, or the month count is not 12 (no
    /// leap month) or 13 (with one).
    pub fn new(year: u16, month_lengths: Vec<u8>, leap_month: Option<u8>) -> Result<Self, Error> {
        if let Some(leap) = leap_month.filter(|leap| *leap == 0 || *leap > MAX_MONTH) {
            return Err(Error::InvalidTable(format!(
                "year {year}: leap month {leap} is not in 1-12"
            )));
        }
        let expected = usize::from(MAX_MONTH) + usize::from(leap_month.is_some());
        if month_lengths.len() != expected {
            return Err(Error::InvalidTable(format!(
                "year {year}: expected {expected} months, found {}",
                month_lengths.len()
            )));
        }
        if let Some(bad) = month_lengths
            .iter()
            .find(|len| **len != SHORT_LUNAR_MONTH && **len != LONG_LUNAR_MONTH)
        {
            return Err(Error::InvalidTable(format!(
                "year {year}: month length {bad} is neither 29 nor 30"
            )));
        }
        Ok(Self {
            year,
            month_lengths,
            leap_month,
        })
    }

    /// Unpacks one entry of the packed table format.
    ///
    /// # Errors
    /// Returns `Error::InvalidTable` if the leap nibble is above 12.
    pub fn from_packed(year: u16, packed: u32) -> Result<Self, Error> {
        let length = |bit: u32| {
            if packed & bit == 0 {
                SHORT_LUNAR_MONTH
            } else {
                LONG_LUNAR_MONTH
            }
        };
        // The nibble is at most 15.
        let leap = (packed & LEAP_MONTH_MASK) as u8;
        let leap_month = (leap != 0).then_some(leap);

        let mut month_lengths = Vec::with_capacity(MAX_LUNAR_MONTHS);
        for n in 1..=MAX_MONTH {
            month_lengths.push(length(LONG_MONTH_BIT >> n));
            if leap_month == Some(n) {
                month_lengths.push(length(LONG_MONTH_BIT));
            }
        }
        Self::new(year, month_lengths, leap_month)
    }

    #[inline]
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Month lengths in calendar order (12 or 13 entries).
    pub fn month_lengths(&self) -> &[u8] {
        &self.month_lengths
    }

    /// Number of the month followed by a leap month, if the year has one.
    #[inline]
    pub const fn leap_month(&self) -> Option<u8> {
        self.leap_month
    }

    /// Days in the whole lunar year.
    pub fn total_days(&self) -> u16 {
        self.month_lengths.iter().copied().map(u16::from).sum()
    }

    /// Days in `month` of this year.
    ///
    /// # Errors
    /// `Error::InvalidMonth` or `Error::InvalidLeapMonth` if the year has no
    /// such month.
    pub fn days_in_month(&self, month: LunarMonth) -> Result<u8, Error> {
        let slot = self.slot(month)?;
        Ok(self.month_lengths[slot])
    }

    /// Position of `month` within [`LunarYearRecord::month_lengths`].
    ///
    /// # Errors
    /// `Error::InvalidMonth` for a month number outside `1..=12`,
    /// `Error::InvalidLeapMonth` for a leap month this year lacks.
    pub fn slot(&self, month: LunarMonth) -> Result<usize, Error> {
        let number = month.number();
        if number == 0 || number > MAX_MONTH {
            return Err(Error::InvalidMonth { month: number });
        }
        match month {
            LunarMonth::Ordinary(n) => {
                let after_leap = self.leap_month.is_some_and(|leap| n > leap);
                Ok(usize::from(n) - 1 + usize::from(after_leap))
            }
            LunarMonth::Leap(n) if self.leap_month == Some(n) => Ok(usize::from(n)),
            LunarMonth::Leap(n) => Err(Error::InvalidLeapMonth {
                year:  self.year,
                month: n,
            }),
        }
    }

    /// Month name at position `slot`; inverse of [`LunarYearRecord::slot`].
    pub(crate) fn month_at(&self, slot: usize) -> LunarMonth {
        // Slots never exceed 12, so the casts are lossless.
        match self.leap_month {
            Some(leap) if slot == usize::from(leap) => LunarMonth::Leap(leap),
            Some(leap) if slot > usize::from(leap) => LunarMonth::Ordinary(slot as u8),
            _ => LunarMonth::Ordinary(slot as u8 + 1),
        }
    }

    /// Months with their lengths, in calendar order.
    pub fn months(&self) -> impl Iterator<Item = (LunarMonth, u8)> + '_ {
        self.month_lengths
            .iter()
            .enumerate()
            .map(|(slot, len)| (self.month_at(slot), *len))
    }
}

/// Year number `index` places after `first_year`.
fn nth_year(first_year: u16, index: usize) -> Result<u16, Error> {
    u16::try_from(index)
        .ok()
        .and_then(|offset| first_year.checked_add(offset))
        .ok_or_else(|| Error::InvalidTable(format!("lunar years run past {}", u16::MAX)))
}

/// Read-only table of consecutive lunar years anchored to a solar epoch.
///
/// The epoch is the solar date of the first day of the first recorded year.
#[derive(Debug, Clone)]
pub struct LunarTable {
    epoch:       SolarDate,
    last_date:   SolarDate,
    records:     Vec<LunarYearRecord>,
    /// Day offset from the epoch of each record's new year, plus the offset
    /// one past the last day.
    year_starts: Vec<i64>,
}

impl LunarTable {
    /// Builds a table from records of consecutive years.
    ///
    /// # Errors
    /// Returns `Error::InvalidTable` if `records` is empty or the years are
    /// not consecutive, and `Error::OutOfRange` if the last year would end
    /// after 9999-12-31.
    pub fn new(epoch: SolarDate, records: Vec<LunarYearRecord>) -> Result<Self, Error> {
        let Some(first) = records.first() else {
            return Err(Error::InvalidTable("no lunar years".to_owned()));
        };
        let first_year = first.year();
        for (index, record) in records.iter().enumerate() {
            let expected = nth_year(first_year, index)?;
            if record.year() != expected {
                return Err(Error::InvalidTable(format!(
                    "expected lunar year {expected}, found {}",
                    record.year()
                )));
            }
        }

        let mut year_starts = Vec::with_capacity(records.len() + 1);
        let mut offset = 0_i64;
        year_starts.push(offset);
        for record in &records {
            offset += i64::from(record.total_days());
            year_starts.push(offset);
        }
        let last_date = epoch.add_days(offset - 1)?;

        Ok(Self {
            epoch,
            last_date,
            records,
            year_starts,
        })
    }

    /// Builds a table from entries in the packed format of the bundled data.
    ///
    /// # Errors
    /// Same as [`LunarTable::new`] and [`LunarYearRecord::from_packed`].
    pub fn from_packed(epoch: SolarDate, first_year: u16, data: &[u32]) -> Result<Self, Error> {
        let records = data
            .iter()
            .enumerate()
            .map(|(index, packed)| LunarYearRecord::from_packed(nth_year(first_year, index)?, *packed))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(epoch, records)
    }

    /// The bundled Chinese table for lunar years 1900 to 2100.
    ///
    /// Built on first use and shared for the rest of the process.
    #[allow(clippy::expect_used)]
    pub fn chinese() -> &'static Self {
        static CHINESE: OnceLock<LunarTable> = OnceLock::new();
        CHINESE.get_or_init(|| {
            let (year, month, day) = LUNAR_EPOCH;
            SolarDate::new(year, month, day)
                .and_then(|epoch| Self::from_packed(epoch, MIN_LUNAR_YEAR, &CHINESE_YEAR_DATA))
                .expect("bundled Chinese lunar data is well-formed")
        })
    }

    /// Solar date of the first day of the first recorded year.
    #[inline]
    pub const fn epoch(&self) -> SolarDate {
        self.epoch
    }

    /// Solar date of the last day of the last recorded year.
    #[inline]
    pub const fn last_date(&self) -> SolarDate {
        self.last_date
    }

    pub fn first_year(&self) -> u16 {
        self.records.first().map_or(0, LunarYearRecord::year)
    }

    pub fn last_year(&self) -> u16 {
        self.records.last().map_or(0, LunarYearRecord::year)
    }

    pub fn records(&self) -> &[LunarYearRecord] {
        &self.records
    }

    /// Record for lunar `year`.
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if the table does not cover `year`.
    pub fn lookup(&self, year: u16) -> Result<&LunarYearRecord, Error> {
        year.checked_sub(self.first_year())
            .and_then(|index| self.records.get(usize::from(index)))
            .ok_or_else(|| Error::out_of_range(format!("lunar year {year}")))
    }

    /// Day offset from the epoch to the new year of lunar `year`.
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if the table does not cover `year`.
    pub fn year_start(&self, year: u16) -> Result<i64, Error> {
        let record = self.lookup(year)?;
        Ok(self.year_starts[usize::from(record.year() - self.first_year())])
    }

    /// Number of days covered by the table.
    pub fn total_days(&self) -> i64 {
        self.year_starts.last().copied().unwrap_or(0)
    }

    /// Finds the record containing day `offset` and the offset within it.
    pub(crate) fn locate(&self, offset: i64) -> Option<(&LunarYearRecord, i64)> {
        if offset < 0 || offset >= self.total_days() {
            return None;
        }
        let index = self.year_starts.partition_point(|start| *start <= offset) - 1;
        let record = self.records.get(index)?;
        Some((record, offset - self.year_starts[index]))
    }
}
