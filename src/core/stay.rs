//! Half-open stay ranges.
//!
//! A stay `[start_date, end_date)` occupies and bills every night from
//! check-in up to, but not including, the checkout date.

use crate::errors::{Error, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A validated check-in/checkout pair with `start_date < end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStayRange")]
pub struct StayRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

/// Unchecked wire shape; deserialization goes through `StayRange::new`.
#[derive(Deserialize)]
struct RawStayRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TryFrom<RawStayRange> for StayRange {
    type Error = Error;

    fn try_from(raw: RawStayRange) -> Result<Self> {
        Self::new(raw.start_date, raw.end_date)
    }
}

impl StayRange {
    /// Builds a range, rejecting empty or inverted ones.
    ///
    /// # Errors
    /// Returns `Error::InvalidDateRange` when `end_date <= start_date`.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if end_date <= start_date {
            return Err(Error::InvalidDateRange {
                start_date,
                end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Range starting `start_offset` days after `today` and ending
    /// `end_offset` days after it.
    ///
    /// # Errors
    /// Returns `Error::InvalidDateRange` if the offsets do not produce a
    /// non-empty range, or `Error::Validation` for negative offsets.
    pub fn from_offsets(today: NaiveDate, start_offset: i64, end_offset: i64) -> Result<Self> {
        let shift = |offset: i64| -> Result<NaiveDate> {
            let days = u64::try_from(offset).map_err(|_| Error::Validation {
                message: format!("Day offset must not be negative, got {offset}"),
            })?;
            today
                .checked_add_days(Days::new(days))
                .ok_or_else(|| Error::Validation {
                    message: format!("Day offset {offset} overflows the calendar"),
                })
        };
        Self::new(shift(start_offset)?, shift(end_offset)?)
    }

    /// Check-in date
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Checkout date
    #[must_use]
    pub const fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Every billed night, in order.
    pub fn nights(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |night| *night < end)
    }

    /// Number of billed nights (always at least one).
    #[must_use]
    pub fn num_nights(&self) -> i64 {
        self.end_date
            .signed_duration_since(self.start_date)
            .num_days()
    }

    /// Half-open overlap with another `[start, end)` pair.
    #[must_use]
    pub fn overlaps(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        ranges_overlap(self.start_date, self.end_date, start_date, end_date)
    }
}

/// Half-open interval overlap: `a_start < b_end && a_end > b_start`.
///
/// Touching ranges (one ends the day the other starts) do not overlap.
#[must_use]
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && a_end > b_start
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_new_rejects_empty_and_inverted_ranges() {
        let same = StayRange::new(date(2026, 3, 5), date(2026, 3, 5));
        assert!(matches!(same, Err(Error::InvalidDateRange { .. })));

        let inverted = StayRange::new(date(2026, 3, 6), date(2026, 3, 5));
        assert!(matches!(inverted, Err(Error::InvalidDateRange { .. })));
    }

    #[test]
    fn test_deserialize_validates_range() {
        let stay: StayRange =
            toml::from_str("start_date = \"2026-03-01\"\nend_date = \"2026-03-10\"").unwrap();
        assert_eq!(stay.num_nights(), 9);

        let inverted =
            toml::from_str::<StayRange>("start_date = \"2026-03-10\"\nend_date = \"2026-03-01\"");
        assert!(inverted.is_err());
    }

    #[test]
    fn test_nights_exclude_checkout_day() {
        let stay = StayRange::new(date(2026, 2, 27), date(2026, 3, 2)).unwrap();
        let nights: Vec<_> = stay.nights().collect();
        assert_eq!(
            nights,
            vec![date(2026, 2, 27), date(2026, 2, 28), date(2026, 3, 1)]
        );
        assert_eq!(stay.num_nights(), 3);
    }

    #[test]
    fn test_from_offsets_defaults_to_tomorrow_plus_five() {
        let stay = StayRange::from_offsets(date(2026, 10, 19), 1, 5).unwrap();
        assert_eq!(stay.start_date(), date(2026, 10, 20));
        assert_eq!(stay.end_date(), date(2026, 10, 24));

        assert!(StayRange::from_offsets(date(2026, 10, 19), -1, 5).is_err());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let existing = StayRange::new(date(2026, 3, 1), date(2026, 3, 5)).unwrap();

        // Adjacent ranges on either side are free
        assert!(!existing.overlaps(date(2026, 3, 5), date(2026, 3, 8)));
        assert!(!existing.overlaps(date(2026, 2, 25), date(2026, 3, 1)));

        // Partial, containing and contained ranges collide
        assert!(existing.overlaps(date(2026, 3, 4), date(2026, 3, 8)));
        assert!(existing.overlaps(date(2026, 2, 25), date(2026, 3, 10)));
        assert!(existing.overlaps(date(2026, 3, 2), date(2026, 3, 3)));
        assert!(existing.overlaps(date(2026, 2, 28), date(2026, 3, 2)));
    }
}
