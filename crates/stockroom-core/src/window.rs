//! # Reporting Windows
//!
//! A calendar month in UTC, used to scope sales aggregation.
//!
//! ```text
//!   March 2026
//!   ├── start = 2026-03-01T00:00:00Z   (inclusive)
//!   │
//!   │   ... every instant of 31 March is inside ...
//!   │
//!   └── end   = 2026-04-01T00:00:00Z   (exclusive)
//! ```
//!
//! The half-open form covers the whole last day without having to pick a
//! "23:59:59.999" end point.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 9999;

/// A validated month-long UTC date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthWindow {
    year: i32,
    month: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl MonthWindow {
    /// Builds the window for `month` (1-12) of `year`.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::window::MonthWindow;
    ///
    /// let w = MonthWindow::new(2026, 2).unwrap();
    /// assert_eq!(w.start().to_rfc3339(), "2026-02-01T00:00:00+00:00");
    /// assert_eq!(w.end().to_rfc3339(), "2026-03-01T00:00:00+00:00");
    /// assert!(MonthWindow::new(2026, 13).is_err());
    /// ```
    pub fn new(year: i32, month: u32) -> ValidationResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            });
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ValidationError::OutOfRange {
                field: "year".to_string(),
                min: MIN_YEAR as i64,
                max: MAX_YEAR as i64,
            });
        }

        let start = first_instant(year, month)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = first_instant(next_year, next_month)?;

        Ok(MonthWindow {
            year,
            month,
            start,
            end,
        })
    }

    /// Builds a window from optional query parameters. Both are required.
    pub fn from_parts(month: Option<u32>, year: Option<i32>) -> ValidationResult<Self> {
        let month = month.ok_or_else(|| ValidationError::required("month"))?;
        let year = year.ok_or_else(|| ValidationError::required("year"))?;
        Self::new(year, month)
    }

    /// The window containing `instant`.
    pub fn containing(instant: DateTime<Utc>) -> ValidationResult<Self> {
        Self::new(instant.year(), instant.month())
    }

    #[inline]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[inline]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// First instant of the month (inclusive).
    #[inline]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// First instant of the following month (exclusive).
    #[inline]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Report label, e.g. `2026-3`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }

    /// Attachment name for the sales-frequency CSV export.
    pub fn csv_filename(&self) -> String {
        format!("sales-frequency-{}-{}.csv", self.year, self.month)
    }
}

fn first_instant(year: i32, month: u32) -> ValidationResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "month".to_string(),
            reason: format!("{year}-{month} is not a valid calendar month"),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
