/// Minimum valid Gregorian year (inclusive)
pub const MIN_YEAR: u16 = 1;
/// Maximum valid Gregorian year (inclusive)
pub const MAX_YEAR: u16 = 9999;

/// Maximum valid month number, in both calendars
pub const MAX_MONTH: u8 = 12;

/// First day of month, used for lower bounds
pub const MIN_DAY: u8 = 1;

/// Month number for January
pub const JANUARY: u8 = 1;
/// Month number for February
pub const FEBRUARY: u8 = 2;

/// Days in February for leap years
pub const FEBRUARY_DAYS_LEAP: u8 = 29;

/// Maximum days in each month (index 0 is unused, months are 1-indexed)
/// February shows 28 days (non-leap year default)
pub const DAYS_IN_MONTH: [u8; 13] = [
    0,  // index 0 unused (months are 1-indexed)
    31, // January
    28, // February (non-leap, adjusted by is_leap_year check)
    31, // March
    30, // April
    31, // May
    30, // June
    31, // July
    31, // August
    30, // September
    31, // October
    30, // November
    31, // December
];

/// Leap year occurs every 4 years
pub(crate) const LEAP_YEAR_CYCLE: u16 = 4;
/// Century years are not leap years unless...
pub(crate) const CENTURY_CYCLE: u16 = 100;
/// ...they are divisible by 400 (Gregorian calendar correction)
pub(crate) const GREGORIAN_CYCLE: u16 = 400;

/// Days in a common Gregorian year
pub(crate) const DAYS_PER_YEAR: i64 = 365;
/// Days in each 4-year block that contains a leap year
pub(crate) const DAYS_PER_4_YEARS: i64 = 1461;
/// Days in a century whose final year is not a leap year
pub(crate) const DAYS_PER_100_YEARS: i64 = 36_524;
/// Days in a full Gregorian cycle
pub(crate) const DAYS_PER_400_YEARS: i64 = 146_097;

/// First lunar year recorded in the bundled Chinese table
pub const MIN_LUNAR_YEAR: u16 = 1900;
/// Last lunar year recorded in the bundled Chinese table
pub const MAX_LUNAR_YEAR: u16 = 2100;

/// Gregorian date of lunar 1900, month 1, day 1 as `(year, month, day)`
pub const LUNAR_EPOCH: (u16, u8, u8) = (1900, 1, 31);

/// Length of a short ("small") lunar month
pub const SHORT_LUNAR_MONTH: u8 = 29;
/// Length of a long ("big") lunar month
pub const LONG_LUNAR_MONTH: u8 = 30;
/// Maximum number of months in a lunar year (12 plus one leap month)
pub const MAX_LUNAR_MONTHS: usize = 13;

/// Annual occurrences generated per person unless configured otherwise
pub const DEFAULT_RECURRENCE_YEARS: u16 = 100;

/// Date component separator (ISO 8601 format)
pub const DATE_SEPARATOR: char = '-';
/// Prefix marking a leap month in the text form of a lunar date
pub const LEAP_MONTH_PREFIX: char = 'L';
