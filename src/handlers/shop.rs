use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::PurchaseRequest;
use crate::error::{AppError, AppResult};
use crate::events::AppEvent;
use crate::handlers::users::ready_user;
use crate::models::shop::{find_item, PurchaseOutcome, ShopItem, CATALOG};
use crate::AppState;

pub async fn list_items() -> Json<&'static [ShopItem]> {
    Json(CATALOG)
}

pub async fn purchase(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<PurchaseRequest>,
) -> AppResult<Json<PurchaseOutcome>> {
    body.validate()?;

    let item = find_item(&body.item_id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown item '{}'", body.item_id)))?;

    let _guard = state.inflight.acquire("purchase", auth_user.id, item.id)?;

    let user = ready_user(&state, &auth_user).await?;
    let outcome = state.store.purchase(user.id, item).await?;

    tracing::info!(
        user_id = %user.id,
        item_id = %item.id,
        price = item.price,
        balance = outcome.balance,
        "Item purchased"
    );
    state.events.publish(AppEvent::BalanceChanged {
        user_id: user.id,
        balance: outcome.balance,
    });

    Ok(Json(outcome))
}
