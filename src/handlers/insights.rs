use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;

use crate::auth::middleware::AuthUser;
use crate::dto::WeeklyInsightQuery;
use crate::error::{AppError, AppResult};
use crate::services::history::parse_offset;
use crate::services::insights::{WeekWindow, WeeklyInsight};
use crate::AppState;

/// Weekly mood and theme summary. Store failures degrade to "No Data".
pub async fn get_weekly_insight(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<WeeklyInsightQuery>,
) -> AppResult<Json<WeeklyInsight>> {
    if query.week_offset > 0 {
        return Err(AppError::Validation(
            "week_offset cannot point to a future week".into(),
        ));
    }

    let offset = parse_offset(query.tz_offset_minutes)?;
    let today = Utc::now().with_timezone(&offset).date_naive();
    let week = WeekWindow::for_offset(today, query.week_offset)?;
    let (start, end) = week.utc_bounds(offset)?;

    let insight = match state.store.diaries_between(auth_user.id, start, end).await {
        Ok(entries) => WeeklyInsight::build(week, &entries),
        Err(e) => {
            tracing::warn!(user_id = %auth_user.id, error = %e, "Weekly insight unavailable");
            WeeklyInsight::no_data(week)
        }
    };

    Ok(Json(insight))
}
