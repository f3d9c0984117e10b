//! Inclusive day ranges.
//!
//! A [`DaySpan`] covers every calendar day from its start to its end date,
//! both included. A span that starts and ends on the same day lasts one day.
//! All interval arithmetic of the layout engine (intersection, gaps, clipping
//! to the calendar window) goes through this type.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a span would end before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("span ends on {end} before it starts on {start}")]
pub struct SpanError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// An inclusive range of calendar days.
///
/// # Examples
///
/// ```
/// # use almanac_core::span::DaySpan;
/// # use chrono::NaiveDate;
/// let date = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
/// let a = DaySpan::new(date(1), date(10)).unwrap();
/// let b = DaySpan::new(date(5), date(15)).unwrap();
///
/// assert_eq!(a.days(), 10);
/// assert_eq!(a.intersect(b).map(DaySpan::days), Some(6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSpan", into = "RawSpan")]
pub struct DaySpan {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Serialize, Deserialize)]
struct RawSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawSpan> for DaySpan {
    type Error = SpanError;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl From<DaySpan> for RawSpan {
    fn from(span: DaySpan) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

impl DaySpan {
    /// Creates a span from `start` to `end`, both included.
    ///
    /// # Errors
    ///
    /// Returns [`SpanError`] when `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SpanError> {
        if end < start {
            return Err(SpanError { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a one-day span.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(self) -> NaiveDate {
        self.start
    }

    pub fn end(self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, counting both ends.
    pub fn days(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Returns true if `other` lies entirely within this span (equality included).
    pub fn covers(self, other: DaySpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(self, other: DaySpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns the days shared by both spans, if any.
    pub fn intersect(self, other: DaySpan) -> Option<DaySpan> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DaySpan { start, end })
    }

    /// Number of empty days strictly between two disjoint spans.
    ///
    /// Returns `None` when the spans share at least one day. Back-to-back
    /// spans (one ends the day before the other starts) have a gap of zero.
    pub fn gap_days(self, other: DaySpan) -> Option<i64> {
        if self.overlaps(other) {
            return None;
        }
        let (first, second) = if self.end < other.start {
            (self, other)
        } else {
            (other, self)
        };
        Some((second.start - first.end).num_days() - 1)
    }

    /// Restricts this span to `window`. Same as [`DaySpan::intersect`].
    pub fn clip(self, window: DaySpan) -> Option<DaySpan> {
        self.intersect(window)
    }

    /// Zero-based index of `date` relative to the span start.
    pub fn offset_of(self, date: NaiveDate) -> Option<usize> {
        if !self.contains(date) {
            return None;
        }
        usize::try_from((date - self.start).num_days()).ok()
    }

    /// Iterates over every date of the span in ascending order.
    pub fn dates(self) -> impl Iterator<Item = NaiveDate> {
        let days = usize::try_from(self.days()).unwrap_or_default();
        self.start.iter_days().take(days)
    }
}

impl fmt::Display for DaySpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..={}", self.start, self.end)
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn span_strategy() -> impl Strategy<Value = DaySpan> {
        (0i64..400, 0i64..60).prop_map(|(offset, len)| {
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let start = base + chrono::Days::new(offset as u64);
            let end = start + chrono::Days::new(len as u64);
            DaySpan::new(start, end).unwrap()
        })
    }

    // ===================
    // Property Checks
    // ===================

    fn check_intersect_is_commutative(a: DaySpan, b: DaySpan) -> Result<(), TestCaseError> {
        prop_assert_eq!(a.intersect(b), b.intersect(a));
        Ok(())
    }

    fn check_intersect_is_covered_by_both(a: DaySpan, b: DaySpan) -> Result<(), TestCaseError> {
        if let Some(shared) = a.intersect(b) {
            prop_assert!(a.covers(shared));
            prop_assert!(b.covers(shared));
            prop_assert!(shared.days() <= a.days().min(b.days()));
        }
        Ok(())
    }

    fn check_gap_xor_overlap(a: DaySpan, b: DaySpan) -> Result<(), TestCaseError> {
        prop_assert_eq!(a.gap_days(b).is_some(), a.intersect(b).is_none());
        if let Some(gap) = a.gap_days(b) {
            prop_assert!(gap >= 0);
        }
        Ok(())
    }

    fn check_dates_len_matches_days(s: DaySpan) -> Result<(), TestCaseError> {
        prop_assert_eq!(s.dates().count() as i64, s.days());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn intersect_is_commutative(a in span_strategy(), b in span_strategy()) {
            check_intersect_is_commutative(a, b)?;
        }

        #[test]
        fn intersect_is_covered_by_both(a in span_strategy(), b in span_strategy()) {
            check_intersect_is_covered_by_both(a, b)?;
        }

        #[test]
        fn gap_xor_overlap(a in span_strategy(), b in span_strategy()) {
            check_gap_xor_overlap(a, b)?;
        }

        #[test]
        fn dates_len_matches_days(s in span_strategy()) {
            check_dates_len_matches_days(s)?;
        }
    }
}
