use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreatePostRequest, PostListQuery};
use crate::error::{AppError, AppResult};
use crate::events::AppEvent;
use crate::handlers::users::ready_user;
use crate::models::post::{LikeState, Post, PostView};
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreatePostRequest>,
) -> AppResult<Json<PostView>> {
    body.validate()?;

    let user = ready_user(&state, &auth_user).await?;

    let post = Post {
        id: Uuid::new_v4(),
        user_id: user.id,
        author_name: user.display_name,
        content: body.content,
        image_url: body.image_url,
        like_count: 0,
        created_at: Utc::now(),
    };

    state.store.insert_post(&post).await?;

    tracing::info!(user_id = %user.id, post_id = %post.id, "Post created");
    state.events.publish(AppEvent::PostCreated {
        user_id: user.id,
        post_id: post.id,
    });

    Ok(Json(PostView {
        post,
        liked_by_me: false,
    }))
}

/// Newest first, annotated with the caller's likes.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<PostListQuery>,
) -> AppResult<Json<Vec<PostView>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let posts = state.store.recent_posts(limit).await?;
    let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let liked = state.store.liked_post_ids(auth_user.id, &ids).await?;

    let views = posts
        .into_iter()
        .map(|post| {
            let liked_by_me = liked.contains(&post.id);
            PostView { post, liked_by_me }
        })
        .collect();

    Ok(Json(views))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
) -> AppResult<Json<LikeState>> {
    let _guard = state
        .inflight
        .acquire("like", auth_user.id, &post_id.to_string())?;

    let like = state
        .store
        .toggle_like(post_id, auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    tracing::debug!(user_id = %auth_user.id, post_id = %post_id, liked = like.liked, "Like toggled");
    state.events.publish(AppEvent::PostLiked {
        user_id: auth_user.id,
        post_id,
        liked: like.liked,
        like_count: like.like_count,
    });

    Ok(Json(like))
}
