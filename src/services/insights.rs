//! Weekly mood and theme aggregation.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::AppResult;
use crate::models::diary::DiaryEntry;
use crate::services::calendar::shift_days;

const TOP_THEME_COUNT: usize = 3;

/// Background/text color pairs for the 1st, 2nd and 3rd theme.
const RANK_COLORS: [(&str, &str); TOP_THEME_COUNT] = [
    ("#FFD6E0", "#A8325E"),
    ("#D6ECFF", "#2F5E8C"),
    ("#E3F7D9", "#3F7A2B"),
];
const NEUTRAL_COLORS: (&str, &str) = ("#EEEEEE", "#555555");

/// Sunday-aligned week, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub offset: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    /// Weeks far enough in the past fall off the calendar and are rejected.
    pub fn for_offset(today: NaiveDate, offset: i32) -> AppResult<Self> {
        let current_start = shift_days(today, -(today.weekday().num_days_from_sunday() as i64))?;
        let start = shift_days(current_start, i64::from(offset) * 7)?;
        Ok(Self {
            offset,
            start,
            end: shift_days(start, 6)?,
        })
    }

    /// UTC instants `[start, end)` covering the week in the caller's offset.
    pub fn utc_bounds(&self, offset: FixedOffset) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        let to_utc = |date: NaiveDate| {
            let midnight = date.and_time(NaiveTime::MIN);
            offset
                .from_local_datetime(&midnight)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
        };
        Ok((to_utc(self.start), to_utc(shift_days(self.end, 1)?)))
    }

    pub fn can_go_next(&self) -> bool {
        next_week_offset(self.offset).is_some()
    }
}

/// The next week is only reachable while it does not lie in the future.
pub fn next_week_offset(offset: i32) -> Option<i32> {
    let next = offset.checked_add(1)?;
    (next <= 0).then_some(next)
}

pub fn previous_week_offset(offset: i32) -> i32 {
    offset.saturating_sub(1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodSummary {
    pub mood: Option<String>,
    pub display_name: String,
    pub count: usize,
    pub image: String,
    pub background_color: String,
}

impl MoodSummary {
    pub fn no_data() -> Self {
        Self {
            mood: None,
            display_name: "No Data".into(),
            count: 0,
            image: "mood_nodata.png".into(),
            background_color: "#F5F5F5".into(),
        }
    }
}

pub fn normalize_mood(label: &str) -> String {
    let label = label.trim().to_lowercase();
    match label.as_str() {
        "joy" => "happiness".into(),
        _ => label,
    }
}

fn mood_style(mood: &str) -> (&'static str, &'static str) {
    match mood {
        "happiness" => ("mood_happiness.png", "#FFF4C2"),
        "sadness" => ("mood_sadness.png", "#D6E4F0"),
        "anger" => ("mood_anger.png", "#F8D0C8"),
        "fear" => ("mood_fear.png", "#E2D6F0"),
        "surprise" => ("mood_surprise.png", "#FFE3C2"),
        "disgust" => ("mood_disgust.png", "#DCEFD0"),
        "love" => ("mood_love.png", "#FBD3E9"),
        _ => ("mood_neutral.png", "#E8E8E8"),
    }
}

fn display_name(mood: &str) -> String {
    let mut chars = mood.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Counts preserving first-seen order, so ties resolve to the earliest label.
fn ordered_counts(labels: impl IntoIterator<Item = String>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    counts
}

pub fn most_frequent_mood(entries: &[DiaryEntry]) -> MoodSummary {
    let counts = ordered_counts(
        entries
            .iter()
            .map(|e| normalize_mood(&e.mood))
            .filter(|m| !m.is_empty()),
    );

    let mut best: Option<&(String, usize)> = None;
    for candidate in &counts {
        if best.map_or(true, |(_, n)| candidate.1 > *n) {
            best = Some(candidate);
        }
    }

    match best {
        Some((mood, count)) => {
            let (image, background) = mood_style(mood);
            MoodSummary {
                mood: Some(mood.clone()),
                display_name: display_name(mood),
                count: *count,
                image: image.into(),
                background_color: background.into(),
            }
        }
        None => MoodSummary::no_data(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeSummary {
    pub theme_name: String,
    pub count: usize,
    /// Share of all keyword occurrences in the window, 0–100.
    pub percentage: f64,
    pub background_color: String,
    pub text_color: String,
}

pub fn top_themes(entries: &[DiaryEntry]) -> Vec<ThemeSummary> {
    let mut counts = ordered_counts(
        entries
            .iter()
            .flat_map(|e| e.keyword_list().map(str::to_string)),
    );
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return Vec::new();
    }

    // Stable: equal counts keep insertion order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(TOP_THEME_COUNT)
        .enumerate()
        .map(|(rank, (theme_name, count))| {
            let (background, text) = RANK_COLORS.get(rank).copied().unwrap_or(NEUTRAL_COLORS);
            ThemeSummary {
                theme_name,
                count,
                percentage: count as f64 / total as f64 * 100.0,
                background_color: background.into(),
                text_color: text.into(),
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct WeeklyInsight {
    pub week: WeekWindow,
    pub can_go_next: bool,
    pub previous_offset: i32,
    pub next_offset: Option<i32>,
    pub entry_count: usize,
    pub mood: MoodSummary,
    pub themes: Vec<ThemeSummary>,
}

impl WeeklyInsight {
    pub fn build(week: WeekWindow, entries: &[DiaryEntry]) -> Self {
        Self {
            week,
            can_go_next: week.can_go_next(),
            previous_offset: previous_week_offset(week.offset),
            next_offset: next_week_offset(week.offset),
            entry_count: entries.len(),
            mood: most_frequent_mood(entries),
            themes: top_themes(entries),
        }
    }

    pub fn no_data(week: WeekWindow) -> Self {
        Self::build(week, &[])
    }
}
