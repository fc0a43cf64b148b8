//! Calendar views over the diary history: the 7-day strip around a selected
//! date and the full month grid.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::error::{AppError, AppResult};

const WINDOW_RADIUS: i64 = 3;
const GRID_DAYS: i64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses `YYYY-MM`.
    pub fn parse(s: &str) -> AppResult<Self> {
        let invalid = || AppError::Validation(format!("Invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let ym = Self { year, month };
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(ym)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

/// `date` moved by `days`, or a validation error when the result leaves the
/// representable calendar.
pub fn shift_days(date: NaiveDate, days: i64) -> AppResult<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| AppError::Validation(format!("Date out of range near {}", date)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_selected: bool,
    pub is_current_month: bool,
    pub has_diary: bool,
}

fn tag_day(
    date: NaiveDate,
    month: YearMonth,
    selected: NaiveDate,
    diary_dates: &HashSet<NaiveDate>,
) -> CalendarDay {
    CalendarDay {
        date,
        is_selected: date == selected,
        is_current_month: month.contains(date),
        has_diary: diary_dates.contains(&date),
    }
}

/// Seven consecutive days centered on `selected`, or on `today` when the
/// selection lies outside the displayed month. Days may spill into the
/// neighbouring months.
pub fn week_window(
    month: YearMonth,
    selected: NaiveDate,
    today: NaiveDate,
    diary_dates: &HashSet<NaiveDate>,
) -> AppResult<Vec<CalendarDay>> {
    let center = if month.contains(selected) { selected } else { today };

    (-WINDOW_RADIUS..=WINDOW_RADIUS)
        .map(|offset| Ok(tag_day(shift_days(center, offset)?, month, selected, diary_dates)))
        .collect()
}

/// Six Sunday-aligned weeks covering the month.
pub fn month_grid(
    month: YearMonth,
    selected: NaiveDate,
    diary_dates: &HashSet<NaiveDate>,
) -> AppResult<Vec<CalendarDay>> {
    let first = month.first_day();
    let start = shift_days(first, -(first.weekday().num_days_from_sunday() as i64))?;

    (0..GRID_DAYS)
        .map(|offset| Ok(tag_day(shift_days(start, offset)?, month, selected, diary_dates)))
        .collect()
}
