//! Card expiry dates.
//!
//! A card expires at the last second (23:59:59 UTC) of the last day of its
//! expiry month. Month and year values that cannot name a real month degrade
//! to the Unix epoch, so such a card always reads as expired.

use chrono::{DateTime, NaiveDate, Utc};

/// Days per month in a common year, indexed by month number.
const MONTH_DAYS: [u32; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A value that can be used as an expiry (or start) month or year.
///
/// Blank strings, zero and unparseable text normalize to `None`, which the
/// validator reports as a missing field. Everything else keeps its numeric
/// value, even when out of range, so validation can report it.
///
/// # Examples
///
/// ```
/// use paygate::card::ExpiryPart;
///
/// assert_eq!(12_i32.normalize(), Some(12));
/// assert_eq!(0_i32.normalize(), None);
/// assert_eq!(" 07 ".normalize(), Some(7));
/// assert_eq!("".normalize(), None);
/// assert_eq!(None::<i32>.normalize(), None);
/// ```
pub trait ExpiryPart {
    /// Normalizes the value to a month or year number.
    fn normalize(self) -> Option<i32>;
}

impl ExpiryPart for i32 {
    fn normalize(self) -> Option<i32> {
        (self != 0).then_some(self)
    }
}

impl ExpiryPart for u32 {
    fn normalize(self) -> Option<i32> {
        i32::try_from(self).ok().and_then(ExpiryPart::normalize)
    }
}

impl ExpiryPart for &str {
    fn normalize(self) -> Option<i32> {
        self.trim().parse::<i32>().ok().and_then(ExpiryPart::normalize)
    }
}

impl ExpiryPart for String {
    fn normalize(self) -> Option<i32> {
        self.as_str().normalize()
    }
}

impl<T: ExpiryPart> ExpiryPart for Option<T> {
    fn normalize(self) -> Option<i32> {
        self.and_then(ExpiryPart::normalize)
    }
}

/// Expiry month and year of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryDate {
    month: i32,
    year: i32,
}

impl ExpiryDate {
    /// Creates an expiry date. Out of range values are accepted.
    #[must_use]
    pub const fn new(month: i32, year: i32) -> Self {
        Self { month, year }
    }

    /// Expiry month.
    #[must_use]
    pub const fn month(&self) -> i32 {
        self.month
    }

    /// Expiry year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the last instant at which the card is still valid.
    #[must_use]
    pub fn expiration(&self) -> DateTime<Utc> {
        expiration(self.month, self.year)
    }

    /// Returns true if the card has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration()
    }

    /// Returns true if the card has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Returns true for Gregorian leap years.
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` of `year`, or `None` for a month outside 1-12.
#[must_use]
pub fn days_in_month(month: i32, year: i32) -> Option<u32> {
    let index = usize::try_from(month).ok().filter(|m| (1..=12).contains(m))?;
    if index == 2 && is_leap_year(year) { Some(29) } else { Some(MONTH_DAYS[index]) }
}

/// Returns 23:59:59 UTC on the last day of the given month.
///
/// Invalid input (a month outside 1-12, a non-positive year, or a year beyond
/// the supported calendar) returns the Unix epoch.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, TimeZone, Utc};
/// use paygate::card::expiration;
///
/// let end = expiration(2, 2024);
/// assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap());
///
/// assert_eq!(expiration(13, 2024), DateTime::UNIX_EPOCH);
/// ```
#[must_use]
pub fn expiration(month: i32, year: i32) -> DateTime<Utc> {
    if year <= 0 {
        return DateTime::UNIX_EPOCH;
    }

    days_in_month(month, year)
        .zip(u32::try_from(month).ok())
        .and_then(|(day, month)| NaiveDate::from_ymd_opt(year, month, day))
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map_or(DateTime::UNIX_EPOCH, |end| end.and_utc())
}
