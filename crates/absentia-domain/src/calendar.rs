//! Calendar rules: working-day counting and date-range overlap
//!
//! Dates are tenant-local calendar days; no timezone handling happens here.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A range whose start falls after its end
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid date range: start {start} is after end {end}")]
pub struct InvalidRange {
    /// Requested first day
    pub start: NaiveDate,
    /// Requested last day
    pub end: NaiveDate,
}

/// Count the days in `[start, end]` that are not Saturday or Sunday
///
/// # Errors
/// Returns [`InvalidRange`] when `start > end`. The range is never swapped or clamped.
///
/// # Examples
///
/// ```
/// use absentia_domain::working_days;
/// use chrono::NaiveDate;
///
/// let mon = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let wed = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
/// assert_eq!(working_days(mon, wed).unwrap(), 3);
/// ```
pub fn working_days(start: NaiveDate, end: NaiveDate) -> Result<u32, InvalidRange> {
    if start > end {
        return Err(InvalidRange { start, end });
    }

    let total = (end - start).num_days() + 1;
    let full_weeks = total / 7;
    let mut count = full_weeks * 5;

    // Remaining days after the whole weeks, at most six
    let mut day = start + Duration::days(full_weeks * 7);
    while day <= end {
        if !is_weekend(day) {
            count += 1;
        }
        day += Duration::days(1);
    }

    Ok(count as u32)
}

/// True iff the closed intervals `[a_start, a_end]` and `[b_start, b_end]` intersect
pub fn overlaps(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start <= b_end && a_end >= b_start
}

fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// A validated, inclusive date range (`start <= end`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single-day range
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// First day (inclusive)
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day (inclusive)
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Working days covered by the range
    pub fn working_days(&self) -> u32 {
        // start <= end is guaranteed by construction
        working_days(self.start, self.end).unwrap_or(0)
    }

    /// Calendar days covered by the range, weekends included
    pub fn calendar_days(&self) -> u32 {
        let days = (self.end - self.start).num_days() + 1;
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// Whether two ranges share at least one day
    pub fn overlaps(&self, other: &DateRange) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reference_week_span() {
        // Mon 15 Jan 2024 to Wed 17 Jan 2024
        assert_eq!(working_days(date(2024, 1, 15), date(2024, 1, 17)).unwrap(), 3);
    }

    #[test]
    fn test_single_weekday() {
        assert_eq!(working_days(date(2024, 1, 15), date(2024, 1, 15)).unwrap(), 1);
    }

    #[test]
    fn test_single_weekend_day() {
        assert_eq!(working_days(date(2024, 1, 13), date(2024, 1, 13)).unwrap(), 0);
        assert_eq!(working_days(date(2024, 1, 14), date(2024, 1, 14)).unwrap(), 0);
    }

    #[test]
    fn test_weekend_only_span() {
        assert_eq!(working_days(date(2024, 1, 13), date(2024, 1, 14)).unwrap(), 0);
    }

    #[test]
    fn test_span_across_weekend() {
        // Fri 19 Jan to Tue 23 Jan
        assert_eq!(working_days(date(2024, 1, 19), date(2024, 1, 23)).unwrap(), 3);
    }

    #[test]
    fn test_multiple_weeks() {
        // Mon 1 Jan 2024 to Sun 28 Jan 2024: four whole weeks
        assert_eq!(working_days(date(2024, 1, 1), date(2024, 1, 28)).unwrap(), 20);
        // Across a leap day: Thu 29 Feb to Mon 4 Mar
        assert_eq!(working_days(date(2024, 2, 29), date(2024, 3, 4)).unwrap(), 3);
    }

    #[test]
    fn test_inverted_range_is_an_error() {
        let err = working_days(date(2024, 1, 17), date(2024, 1, 15)).unwrap_err();
        assert_eq!(err.start, date(2024, 1, 17));
        assert_eq!(err.end, date(2024, 1, 15));
    }

    #[test]
    fn test_overlap_cases() {
        let (a, b) = (date(2024, 1, 15), date(2024, 1, 17));
        assert!(overlaps(a, b, a, b));
        // Touching on a single shared day counts
        assert!(overlaps(a, b, date(2024, 1, 17), date(2024, 1, 20)));
        assert!(!overlaps(a, b, date(2024, 1, 18), date(2024, 1, 20)));
        assert!(overlaps(a, b, date(2024, 1, 1), date(2024, 2, 1)));
    }

    #[test]
    fn test_date_range() {
        assert!(DateRange::new(date(2024, 1, 17), date(2024, 1, 15)).is_err());

        let range = DateRange::new(date(2024, 1, 15), date(2024, 1, 17)).unwrap();
        assert_eq!(range.working_days(), 3);
        assert_eq!(range.calendar_days(), 3);
        assert_eq!(DateRange::new(date(2024, 1, 15), date(2024, 1, 21)).unwrap().calendar_days(), 7);
        assert!(range.overlaps(&DateRange::single(date(2024, 1, 16))));
        assert!(!range.overlaps(&DateRange::single(date(2024, 1, 18))));
    }
}
