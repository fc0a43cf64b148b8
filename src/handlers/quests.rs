use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;

use crate::auth::middleware::AuthUser;
use crate::dto::QuestQuery;
use crate::error::AppResult;
use crate::events::AppEvent;
use crate::handlers::users::ready_user;
use crate::models::quest::{ClaimOutcome, Quest};
use crate::services::quests;
use crate::AppState;

/// Quest days are UTC days.
pub async fn list_quests(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<QuestQuery>,
) -> AppResult<Json<Vec<Quest>>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let quests = quests::evaluate(state.store.as_ref(), auth_user.id, date).await?;
    Ok(Json(quests))
}

pub async fn claim_quest(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(quest_id): Path<String>,
) -> AppResult<Json<ClaimOutcome>> {
    let _guard = state.inflight.acquire("claim", auth_user.id, &quest_id)?;

    let user = ready_user(&state, &auth_user).await?;
    let today = Utc::now().date_naive();
    let outcome = quests::claim(state.store.as_ref(), user.id, &quest_id, today).await?;

    if outcome.granted {
        state.events.publish(AppEvent::QuestClaimed {
            user_id: user.id,
            quest_id: quest_id.clone(),
            reward: outcome.reward,
        });
        state.events.publish(AppEvent::BalanceChanged {
            user_id: user.id,
            balance: outcome.balance,
        });
    }

    Ok(Json(outcome))
}
