use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{DiaryRepository, LedgerRepository, PostRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::models::diary::DiaryEntry;
use crate::models::post::{LikeState, Post};
use crate::models::quest::ClaimOutcome;
use crate::models::shop::{PurchaseOutcome, ShopItem};
use crate::models::user::User;

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn ensure_user(&self, id: Uuid, display_name: &str) -> AppResult<User> {
        // No-op update so RETURNING yields the existing row on conflict
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, display_name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET display_name = users.display_name
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(display_name)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl DiaryRepository for PgStore {
    async fn insert_diary(&self, entry: &DiaryEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO diaries (
                id, user_id, content, mood, sentiment_score, suggestion,
                keywords, emotional_reflection, image_urls, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.content)
        .bind(&entry.mood)
        .bind(entry.sentiment_score)
        .bind(&entry.suggestion)
        .bind(&entry.keywords)
        .bind(&entry.emotional_reflection)
        .bind(&entry.image_urls)
        .bind(entry.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn list_diaries(&self, user_id: Uuid) -> AppResult<Vec<DiaryEntry>> {
        let entries = sqlx::query_as::<_, DiaryEntry>(
            "SELECT * FROM diaries WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(entries)
    }

    async fn diaries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<DiaryEntry>> {
        let entries = sqlx::query_as::<_, DiaryEntry>(
            r#"
            SELECT * FROM diaries
            WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;
        Ok(entries)
    }

    async fn has_diary_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM diaries
                WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
            )
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn insert_post(&self, post: &Post) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, author_name, content, image_url, like_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(post.id)
        .bind(post.user_id)
        .bind(&post.author_name)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(post.like_count)
        .bind(post.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn recent_posts(&self, limit: i64) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(posts)
    }

    async fn liked_post_ids(&self, user_id: Uuid, post_ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT post_id FROM post_likes WHERE user_id = $1 AND post_id = ANY($2)",
        )
        .bind(user_id)
        .bind(post_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn has_post_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM posts
                WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
            )
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> AppResult<Option<LikeState>> {
        let mut tx = self.db.begin().await?;

        // Row lock on the post serializes concurrent toggles
        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let (liked, delta) = if removed > 0 {
            (false, -1i64)
        } else {
            sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            (true, 1i64)
        };

        let like_count = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE posts SET like_count = GREATEST(like_count + $2, 0)
            WHERE id = $1
            RETURNING like_count
            "#,
        )
        .bind(post_id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(LikeState { liked, like_count }))
    }
}

#[async_trait]
impl LedgerRepository for PgStore {
    async fn claimed_quest_ids(
        &self,
        user_id: Uuid,
        quest_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if quest_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT quest_id FROM quest_claims WHERE user_id = $1 AND quest_id = ANY($2)",
        )
        .bind(user_id)
        .bind(quest_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn claim_reward(
        &self,
        user_id: Uuid,
        quest_id: &str,
        reward: i64,
    ) -> AppResult<ClaimOutcome> {
        let mut tx = self.db.begin().await?;

        let balance = sqlx::query_scalar::<_, i64>("SELECT coins FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("User not found".into()))?;

        // First writer wins: the primary key on (user_id, quest_id) is the marker
        let inserted = sqlx::query(
            r#"
            INSERT INTO quest_claims (user_id, quest_id, reward)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, quest_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(quest_id)
        .bind(reward)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(ClaimOutcome {
                granted: false,
                reward,
                balance,
            });
        }

        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users SET coins = coins + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING coins
            "#,
        )
        .bind(user_id)
        .bind(reward)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ClaimOutcome {
            granted: true,
            reward,
            balance,
        })
    }

    async fn owned_items(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let items = sqlx::query_scalar::<_, String>(
            "SELECT item_id FROM purchases WHERE user_id = $1 ORDER BY item_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    async fn purchase(&self, user_id: Uuid, item: &ShopItem) -> AppResult<PurchaseOutcome> {
        let mut tx = self.db.begin().await?;

        let coins = sqlx::query_scalar::<_, i64>("SELECT coins FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("User not found".into()))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO purchases (user_id, item_id, price)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, item_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(item.id)
        .bind(item.price)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict("Item already owned".into()));
        }

        if coins < item.price {
            tx.rollback().await?;
            return Err(AppError::Conflict("Insufficient coins".into()));
        }

        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users SET coins = coins - $2, updated_at = NOW()
            WHERE id = $1
            RETURNING coins
            "#,
        )
        .bind(user_id)
        .bind(item.price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PurchaseOutcome {
            item_id: item.id.to_string(),
            price: item.price,
            balance,
        })
    }
}
