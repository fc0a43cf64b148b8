//! Client for the remote sentiment analysis endpoint.
//!
//! The endpoint answers `{ "emotion": "...", "advice": "..." }` where `advice`
//! is free text carrying dash-prefixed labeled segments:
//!
//! ```text
//! - Suggestion: Take a short walk. - Emotional Reflection: You sound tired.
//! - Mood: sadness - Keywords: work, sleep - Score: 4
//! ```

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::diary::{MAX_SENTIMENT_SCORE, MIN_SENTIMENT_SCORE};

const DEFAULT_SCORE: i32 = 5;

lazy_static! {
    static ref SEGMENT_LABEL: Regex =
        Regex::new(r"(?i)(?:^|\s)-\s*(suggestion|emotional reflection|mood|keywords|score)\s*:")
            .expect("Invalid regex pattern");
    static ref FIRST_NUMBER: Regex =
        Regex::new(r"-?\d+(?:\.\d+)?").expect("Invalid regex pattern");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub mood: String,
    pub sentiment_score: i32,
    pub suggestion: String,
    pub emotional_reflection: String,
    pub keywords: String,
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> AppResult<Analysis>;
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    emotion: String,
    #[serde(default)]
    advice: String,
}

pub struct HttpSentimentClient {
    client: reqwest::Client,
    url: String,
}

impl HttpSentimentClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SentimentAnalyzer for HttpSentimentClient {
    async fn analyze(&self, text: &str) -> AppResult<Analysis> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "sentiment API error {}: {}",
                status, body
            )));
        }

        let body: SentimentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed sentiment response: {}", e)))?;

        tracing::debug!(emotion = %body.emotion, "Sentiment analysis received");
        Ok(parse_advice(&body.advice, &body.emotion))
    }
}

fn clean(segment: &str) -> String {
    segment
        .trim()
        .trim_end_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string()
}

fn normalize_keywords(raw: &str) -> String {
    raw.split(',')
        .map(|k| k.trim().trim_end_matches('.').trim())
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_score(raw: &str) -> Option<i32> {
    let number: f64 = FIRST_NUMBER.find(raw)?.as_str().parse().ok()?;
    Some((number.round() as i32).clamp(MIN_SENTIMENT_SCORE, MAX_SENTIMENT_SCORE))
}

/// Extracts labeled segments from `advice`. Labels match case-insensitively
/// and may appear in any order; a missing mood falls back to `emotion`.
pub fn parse_advice(advice: &str, emotion: &str) -> Analysis {
    let labels: Vec<(String, usize, usize)> = SEGMENT_LABEL
        .captures_iter(advice)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(1)?.as_str().to_lowercase();
            Some((label, whole.start(), whole.end()))
        })
        .collect();

    let mut analysis = Analysis {
        mood: emotion.trim().to_lowercase(),
        sentiment_score: DEFAULT_SCORE,
        suggestion: String::new(),
        emotional_reflection: String::new(),
        keywords: String::new(),
    };

    for (i, (label, _, value_start)) in labels.iter().enumerate() {
        let value_end = labels
            .get(i + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(advice.len());
        let value = clean(&advice[*value_start..value_end]);

        match label.as_str() {
            "suggestion" => analysis.suggestion = value,
            "emotional reflection" => analysis.emotional_reflection = value,
            "mood" if !value.is_empty() => analysis.mood = value.to_lowercase(),
            "keywords" => analysis.keywords = normalize_keywords(&value),
            "score" => {
                if let Some(score) = parse_score(&value) {
                    analysis.sentiment_score = score;
                }
            }
            _ => {}
        }
    }

    analysis
}
