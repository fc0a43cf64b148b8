use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MIN_SENTIMENT_SCORE: i32 = 0;
pub const MAX_SENTIMENT_SCORE: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub mood: String,
    pub sentiment_score: i32,
    pub suggestion: String,
    /// Comma-delimited, as returned by the analysis service.
    pub keywords: String,
    pub emotional_reflection: String,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl DiaryEntry {
    /// Keywords split on commas with blanks dropped.
    pub fn keyword_list(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
pub(crate) fn sample_entry(
    user_id: Uuid,
    created_at: DateTime<Utc>,
    mood: &str,
    keywords: &str,
) -> DiaryEntry {
    DiaryEntry {
        id: Uuid::new_v4(),
        user_id,
        content: "Today was a day.".into(),
        mood: mood.into(),
        sentiment_score: 5,
        suggestion: String::new(),
        keywords: keywords.into(),
        emotional_reflection: String::new(),
        image_urls: vec![],
        created_at,
    }
}
