use std::time::Duration;

use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::EnsureProfileRequest;
use crate::error::AppResult;
use crate::models::user::{User, UserProfile};
use crate::services::session::wait_for_user;
use crate::AppState;

/// Resolves the caller's profile, tolerating a profile that is still being created.
pub async fn ready_user(state: &AppState, auth_user: &AuthUser) -> AppResult<User> {
    wait_for_user(
        state.store.as_ref(),
        auth_user.id,
        state.config.session_ready_attempts,
        Duration::from_millis(state.config.session_ready_delay_ms),
    )
    .await
}

pub async fn ensure_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<EnsureProfileRequest>,
) -> AppResult<Json<UserProfile>> {
    body.validate()?;

    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| auth_user.display_name());

    let user = state.store.ensure_user(auth_user.id, display_name).await?;
    let owned_items = state.store.owned_items(user.id).await?;

    tracing::info!(user_id = %user.id, "Profile ensured");
    Ok(Json(UserProfile::new(user, owned_items)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = ready_user(&state, &auth_user).await?;
    let owned_items = state.store.owned_items(user.id).await?;
    Ok(Json(UserProfile::new(user, owned_items)))
}
