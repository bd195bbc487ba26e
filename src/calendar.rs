//! Academic-term calendar
//!
//! Study-day labels are free text ("Apr 15, Tuesday") with no year. This is
//! the only calendar logic in the system: a fixed month-name-to-ordinal table
//! plus day-of-month yields a day-of-year ordinal used for sorting, week
//! bucketing, and date-range membership. Inputs span a single academic term,
//! so there is no year or leap-year handling.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};

/// Cumulative days before each month (non-leap).
const MONTH_TABLE: [(&str, u16); 12] = [
    ("jan", 0),
    ("feb", 31),
    ("mar", 59),
    ("apr", 90),
    ("may", 120),
    ("jun", 151),
    ("jul", 181),
    ("aug", 212),
    ("sep", 243),
    ("oct", 273),
    ("nov", 304),
    ("dec", 334),
];

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Parse a `"MMM D"` or `"MMM D, Weekday"` label to a day-of-year ordinal
/// (1-based). The weekday suffix, if present, is ignored.
pub fn day_of_year(label: &str) -> Result<u16, ReportError> {
    let head = label.split(',').next().unwrap_or("").trim();
    let mut parts = head.split_whitespace();
    let month_name = parts
        .next()
        .ok_or_else(|| ReportError::DateParse(label.to_string()))?;
    let day_text = parts
        .next()
        .ok_or_else(|| ReportError::DateParse(label.to_string()))?;
    if parts.next().is_some() {
        return Err(ReportError::DateParse(label.to_string()));
    }

    let month_lower = month_name.to_lowercase();
    let month_idx = MONTH_TABLE
        .iter()
        .position(|(name, _)| *name == month_lower)
        .ok_or_else(|| ReportError::DateParse(label.to_string()))?;

    let day: u8 = day_text
        .parse()
        .map_err(|_| ReportError::DateParse(label.to_string()))?;
    if day == 0 || day > DAYS_IN_MONTH[month_idx] {
        return Err(ReportError::DateParse(label.to_string()));
    }

    Ok(MONTH_TABLE[month_idx].1 + day as u16)
}

/// 1-based index of the 7-day window containing `ordinal`, counted from
/// `origin` (the first study day, or a range start).
pub fn week_index(ordinal: u16, origin: u16) -> u32 {
    if ordinal < origin {
        return 1;
    }
    u32::from(ordinal - origin) / 7 + 1
}

/// Inclusive calendar range over two day labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        DateRange {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Resolve both endpoints to ordinals, validating `start <= end`.
    pub fn resolve(&self) -> Result<ResolvedRange, ReportError> {
        let start = day_of_year(&self.start)?;
        let end = day_of_year(&self.end)?;
        if start > end {
            return Err(ReportError::invalid_spec(
                "date_range",
                format!("start '{}' falls after end '{}'", self.start, self.end),
            ));
        }
        Ok(ResolvedRange { start, end })
    }
}

/// A date range resolved to day-of-year ordinals, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u16,
    pub end: u16,
}

impl ResolvedRange {
    pub fn contains(&self, ordinal: u16) -> bool {
        ordinal >= self.start && ordinal <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_year_known_dates() {
        assert_eq!(day_of_year("Jan 1").unwrap(), 1);
        assert_eq!(day_of_year("Feb 28").unwrap(), 59);
        assert_eq!(day_of_year("Apr 15, Tuesday").unwrap(), 105);
        assert_eq!(day_of_year("Dec 31, Wednesday").unwrap(), 365);
    }

    #[test]
    fn test_day_of_year_ignores_weekday_and_case() {
        assert_eq!(day_of_year("apr 1, Monday").unwrap(), 91);
        assert_eq!(day_of_year("APR 1").unwrap(), 91);
    }

    #[test]
    fn test_day_of_year_rejects_garbage() {
        assert!(day_of_year("").is_err());
        assert!(day_of_year("Foo 12").is_err());
        assert!(day_of_year("Apr").is_err());
        assert!(day_of_year("Apr 31").is_err());
        assert!(day_of_year("Apr 0").is_err());
        assert!(day_of_year("Apr 15 16").is_err());
    }

    #[test]
    fn test_week_index_seven_day_windows() {
        let origin = day_of_year("Apr 1").unwrap();
        assert_eq!(week_index(day_of_year("Apr 1").unwrap(), origin), 1);
        assert_eq!(week_index(day_of_year("Apr 7").unwrap(), origin), 1);
        assert_eq!(week_index(day_of_year("Apr 8").unwrap(), origin), 2);
        assert_eq!(week_index(day_of_year("Apr 15").unwrap(), origin), 3);
    }

    #[test]
    fn test_range_membership_inclusive() {
        let range = DateRange::new("Apr 1", "Apr 7").resolve().unwrap();
        assert!(range.contains(day_of_year("Apr 1").unwrap()));
        assert!(range.contains(day_of_year("Apr 7").unwrap()));
        assert!(!range.contains(day_of_year("Apr 8").unwrap()));
        assert!(!range.contains(day_of_year("Mar 31").unwrap()));
    }

    #[test]
    fn test_range_rejects_inverted_endpoints() {
        let err = DateRange::new("May 2", "Apr 30").resolve().unwrap_err();
        assert!(err.to_string().contains("date_range"));
    }
}
