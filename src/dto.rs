//! Request/response DTOs for the HTTP API.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Query`    → deserialized from query params
//! - `*Response` → serialized to client JSON
//! - Validation lives on the DTO via `validator` derives

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::calendar::{CalendarDay, YearMonth};

// ============================================================================
// Users
// ============================================================================

/// POST /api/me
#[derive(Debug, Default, Deserialize, Validate)]
pub struct EnsureProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Display name must be 1-50 characters"))]
    pub display_name: Option<String>,
}

// ============================================================================
// Diaries
// ============================================================================

/// POST /api/diaries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiaryRequest {
    #[validate(length(min = 1, max = 5000, message = "Content must be 1-5000 characters"))]
    pub content: String,

    #[serde(default)]
    #[validate(length(max = 4, message = "At most 4 images per entry"))]
    pub image_urls: Vec<String>,
}

/// GET /api/diaries
#[derive(Debug, Deserialize)]
pub struct DiaryDayQuery {
    pub date: Option<NaiveDate>,
    pub tz_offset_minutes: Option<i32>,
}

/// GET /api/diaries/calendar
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    /// `YYYY-MM`; defaults to the month of `selected`.
    pub month: Option<String>,
    pub selected: Option<NaiveDate>,
    pub tz_offset_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub month: YearMonth,
    pub prev_month: YearMonth,
    pub next_month: YearMonth,
    pub selected: NaiveDate,
    pub window: Vec<CalendarDay>,
    pub grid: Vec<CalendarDay>,
}

// ============================================================================
// Insights
// ============================================================================

/// GET /api/insights/weekly
#[derive(Debug, Deserialize)]
pub struct WeeklyInsightQuery {
    #[serde(default)]
    pub week_offset: i32,
    pub tz_offset_minutes: Option<i32>,
}

// ============================================================================
// Quests
// ============================================================================

/// GET /api/quests
#[derive(Debug, Deserialize)]
pub struct QuestQuery {
    pub date: Option<NaiveDate>,
}

// ============================================================================
// Community
// ============================================================================

/// POST /api/posts
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,

    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
}

/// GET /api/posts
#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub limit: Option<i64>,
}

// ============================================================================
// Shop
// ============================================================================

/// POST /api/shop/purchase
#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseRequest {
    #[validate(length(min = 1, max = 64))]
    pub item_id: String,
}
