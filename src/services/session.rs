use std::time::Duration;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::User;
use crate::store::Store;

/// Looks up the user's profile document, retrying a bounded number of times
/// with a fixed delay. The document is written right after sign-up, so the
/// first requests of a fresh session may arrive before it exists.
pub async fn wait_for_user(
    store: &dyn Store,
    user_id: Uuid,
    attempts: u32,
    delay: Duration,
) -> AppResult<User> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(user) = store.find_user(user_id).await? {
            return Ok(user);
        }
        if attempt < attempts {
            tracing::debug!(user_id = %user_id, attempt, "User profile not ready, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    tracing::warn!(user_id = %user_id, attempts, "User profile still missing");
    Err(AppError::NotFound("User profile not ready".into()))
}
