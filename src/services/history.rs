use std::collections::HashSet;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::diary::DiaryEntry;

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Fixed UTC offset of the caller, in minutes east of UTC.
pub fn parse_offset(minutes: Option<i32>) -> AppResult<FixedOffset> {
    let minutes = minutes.unwrap_or(0);
    if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
        return Err(AppError::Validation(
            "tz_offset_minutes must be within ±840".into(),
        ));
    }
    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| AppError::Validation("Invalid tz_offset_minutes".into()))
}

pub fn local_date(entry: &DiaryEntry, offset: FixedOffset) -> NaiveDate {
    entry.created_at.with_timezone(&offset).date_naive()
}

#[derive(Debug, Serialize)]
pub struct DiaryDay {
    pub date: NaiveDate,
    pub entries: Vec<DiaryEntry>,
    pub is_empty: bool,
}

/// Entries written on `date` in the caller's local time, oldest first.
pub fn entries_on(
    entries: Option<&[DiaryEntry]>,
    date: NaiveDate,
    offset: FixedOffset,
) -> DiaryDay {
    let mut matching: Vec<DiaryEntry> = entries
        .unwrap_or_default()
        .iter()
        .filter(|e| local_date(e, offset) == date)
        .cloned()
        .collect();
    matching.sort_by_key(|e| e.created_at);

    DiaryDay {
        date,
        is_empty: matching.is_empty(),
        entries: matching,
    }
}

pub fn diary_dates(entries: &[DiaryEntry], offset: FixedOffset) -> HashSet<NaiveDate> {
    entries.iter().map(|e| local_date(e, offset)).collect()
}
