use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CalendarQuery, CalendarResponse, CreateDiaryRequest, DiaryDayQuery};
use crate::error::AppResult;
use crate::events::AppEvent;
use crate::handlers::users::ready_user;
use crate::models::diary::DiaryEntry;
use crate::services::calendar::{month_grid, week_window, YearMonth};
use crate::services::history::{diary_dates, entries_on, parse_offset, DiaryDay};
use crate::AppState;

pub async fn create_diary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateDiaryRequest>,
) -> AppResult<Json<DiaryEntry>> {
    body.validate()?;

    state
        .rate_limiter
        .check_analysis(auth_user.id, state.config.analyze_max_per_minute)
        .await?;

    let user = ready_user(&state, &auth_user).await?;

    // Nothing is stored unless the analysis succeeds
    let analysis = state.analyzer.analyze(&body.content).await?;

    let entry = DiaryEntry {
        id: Uuid::new_v4(),
        user_id: user.id,
        content: body.content,
        mood: analysis.mood,
        sentiment_score: analysis.sentiment_score,
        suggestion: analysis.suggestion,
        keywords: analysis.keywords,
        emotional_reflection: analysis.emotional_reflection,
        image_urls: body.image_urls,
        created_at: Utc::now(),
    };

    state.store.insert_diary(&entry).await?;

    tracing::info!(
        user_id = %user.id,
        diary_id = %entry.id,
        mood = %entry.mood,
        score = entry.sentiment_score,
        "Diary saved"
    );

    state.events.publish(AppEvent::DiarySaved {
        user_id: user.id,
        diary_id: entry.id,
    });

    Ok(Json(entry))
}

pub async fn get_diary_day(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DiaryDayQuery>,
) -> AppResult<Json<DiaryDay>> {
    let offset = parse_offset(query.tz_offset_minutes)?;
    let date = query
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&offset).date_naive());

    let entries = state.store.list_diaries(auth_user.id).await?;

    Ok(Json(entries_on(Some(entries.as_slice()), date, offset)))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<CalendarResponse>> {
    let offset = parse_offset(query.tz_offset_minutes)?;
    let today = Utc::now().with_timezone(&offset).date_naive();
    let selected = query.selected.unwrap_or(today);
    let month = match query.month.as_deref() {
        Some(month) => YearMonth::parse(month)?,
        None => YearMonth::of(selected),
    };

    let entries = state.store.list_diaries(auth_user.id).await?;
    let dates = diary_dates(&entries, offset);

    Ok(Json(CalendarResponse {
        month,
        prev_month: month.prev(),
        next_month: month.next(),
        selected,
        window: week_window(month, selected, today, &dates)?,
        grid: month_grid(month, selected, &dates)?,
    }))
}
