use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DiaryRepository, LedgerRepository, PostRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::models::diary::DiaryEntry;
use crate::models::post::{LikeState, Post};
use crate::models::quest::ClaimOutcome;
use crate::models::shop::{PurchaseOutcome, ShopItem};
use crate::models::user::User;

/// In-process store. Every mutating call holds the single lock for its whole
/// read-modify-write, which gives the same all-or-nothing behavior as the
/// Postgres transactions.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    diaries: Vec<DiaryEntry>,
    posts: Vec<Post>,
    likes: HashSet<(Uuid, Uuid)>,
    quest_claims: HashSet<(Uuid, String)>,
    purchases: HashSet<(Uuid, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn ensure_user(&self, id: Uuid, display_name: &str) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let user = state.users.entry(id).or_insert_with(|| User {
            id,
            display_name: display_name.to_string(),
            coins: 0,
            created_at: now,
            updated_at: now,
        });
        Ok(user.clone())
    }
}

#[async_trait]
impl DiaryRepository for MemoryStore {
    async fn insert_diary(&self, entry: &DiaryEntry) -> AppResult<()> {
        self.state.lock().await.diaries.push(entry.clone());
        Ok(())
    }

    async fn list_diaries(&self, user_id: Uuid) -> AppResult<Vec<DiaryEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<DiaryEntry> = state
            .diaries
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|d| d.created_at);
        Ok(entries)
    }

    async fn diaries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<DiaryEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<DiaryEntry> = state
            .diaries
            .iter()
            .filter(|d| d.user_id == user_id && d.created_at >= start && d.created_at < end)
            .cloned()
            .collect();
        entries.sort_by_key(|d| d.created_at);
        Ok(entries)
    }

    async fn has_diary_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .diaries
            .iter()
            .any(|d| d.user_id == user_id && d.created_at >= start && d.created_at < end))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert_post(&self, post: &Post) -> AppResult<()> {
        self.state.lock().await.posts.push(post.clone());
        Ok(())
    }

    async fn recent_posts(&self, limit: i64) -> AppResult<Vec<Post>> {
        let state = self.state.lock().await;
        let mut posts = state.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn liked_post_ids(&self, user_id: Uuid, post_ids: &[Uuid]) -> AppResult<HashSet<Uuid>> {
        let state = self.state.lock().await;
        Ok(post_ids
            .iter()
            .filter(|id| state.likes.contains(&(**id, user_id)))
            .copied()
            .collect())
    }

    async fn has_post_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .posts
            .iter()
            .any(|p| p.user_id == user_id && p.created_at >= start && p.created_at < end))
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> AppResult<Option<LikeState>> {
        let mut state = self.state.lock().await;
        let MemoryState { posts, likes, .. } = &mut *state;

        let Some(post) = posts.iter_mut().find(|p| p.id == post_id) else {
            return Ok(None);
        };

        let liked = if likes.remove(&(post_id, user_id)) {
            post.like_count = (post.like_count - 1).max(0);
            false
        } else {
            likes.insert((post_id, user_id));
            post.like_count += 1;
            true
        };

        Ok(Some(LikeState {
            liked,
            like_count: post.like_count,
        }))
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn claimed_quest_ids(
        &self,
        user_id: Uuid,
        quest_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        let state = self.state.lock().await;
        Ok(quest_ids
            .iter()
            .filter(|id| state.quest_claims.contains(&(user_id, (*id).clone())))
            .cloned()
            .collect())
    }

    async fn claim_reward(
        &self,
        user_id: Uuid,
        quest_id: &str,
        reward: i64,
    ) -> AppResult<ClaimOutcome> {
        let mut state = self.state.lock().await;
        let MemoryState {
            users,
            quest_claims,
            ..
        } = &mut *state;

        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if !quest_claims.insert((user_id, quest_id.to_string())) {
            return Ok(ClaimOutcome {
                granted: false,
                reward,
                balance: user.coins,
            });
        }

        user.coins += reward;
        user.updated_at = Utc::now();
        Ok(ClaimOutcome {
            granted: true,
            reward,
            balance: user.coins,
        })
    }

    async fn owned_items(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        let mut items: Vec<String> = state
            .purchases
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, item)| item.clone())
            .collect();
        items.sort();
        Ok(items)
    }

    async fn purchase(&self, user_id: Uuid, item: &ShopItem) -> AppResult<PurchaseOutcome> {
        let mut state = self.state.lock().await;
        let MemoryState {
            users, purchases, ..
        } = &mut *state;

        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let key = (user_id, item.id.to_string());
        if purchases.contains(&key) {
            return Err(AppError::Conflict("Item already owned".into()));
        }
        if user.coins < item.price {
            return Err(AppError::Conflict("Insufficient coins".into()));
        }

        user.coins -= item.price;
        user.updated_at = Utc::now();
        purchases.insert(key);

        Ok(PurchaseOutcome {
            item_id: item.id.to_string(),
            price: item.price,
            balance: user.coins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shop::find_item;

    fn post(user_id: Uuid, created_at: DateTime<Utc>) -> Post {
        Post {
            id: Uuid::new_v4(),
            user_id,
            author_name: "tester".into(),
            content: "hello".into(),
            image_url: None,
            like_count: 0,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.ensure_user(id, "Ana").await.unwrap();
        let again = store.ensure_user(id, "Renamed").await.unwrap();
        assert_eq!(again.display_name, "Ana");
        assert_eq!(again.coins, 0);
    }

    #[tokio::test]
    async fn test_claim_reward_credits_once() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.ensure_user(id, "Ana").await.unwrap();

        let first = store.claim_reward(id, "diary-20260110", 20).await.unwrap();
        let second = store.claim_reward(id, "diary-20260110", 20).await.unwrap();

        assert!(first.granted);
        assert!(!second.granted);
        assert_eq!(second.balance, 20);
    }

    #[tokio::test]
    async fn test_claim_reward_requires_user() {
        let store = MemoryStore::new();
        let result = store.claim_reward(Uuid::new_v4(), "checkin-20260110", 10).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let store = MemoryStore::new();
        let author = Uuid::new_v4();
        let fan = Uuid::new_v4();
        let p = post(author, Utc::now());
        store.insert_post(&p).await.unwrap();

        let liked = store.toggle_like(p.id, fan).await.unwrap().unwrap();
        assert_eq!(liked, LikeState { liked: true, like_count: 1 });

        let unliked = store.toggle_like(p.id, fan).await.unwrap().unwrap();
        assert_eq!(unliked, LikeState { liked: false, like_count: 0 });
    }

    #[tokio::test]
    async fn test_toggle_like_unknown_post() {
        let store = MemoryStore::new();
        let result = store.toggle_like(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_purchase_deducts_and_blocks_repeat() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.ensure_user(id, "Ana").await.unwrap();
        store.claim_reward(id, "checkin-20260110", 100).await.unwrap();

        let sticker = find_item("sticker-cat").unwrap();
        let outcome = store.purchase(id, sticker).await.unwrap();
        assert_eq!(outcome.balance, 70);

        let repeat = store.purchase(id, sticker).await;
        assert!(matches!(repeat, Err(AppError::Conflict(_))));
        assert_eq!(store.owned_items(id).await.unwrap(), vec!["sticker-cat".to_string()]);
    }

    #[tokio::test]
    async fn test_purchase_insufficient_coins_leaves_balance() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.ensure_user(id, "Ana").await.unwrap();

        let frame = find_item("frame-gold").unwrap();
        let result = store.purchase(id, frame).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let user = store.find_user(id).await.unwrap().unwrap();
        assert_eq!(user.coins, 0);
        assert!(store.owned_items(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_has_post_between_uses_half_open_bounds() {
        let store = MemoryStore::new();
        let author = Uuid::new_v4();
        let start = Utc::now();
        let end = start + chrono::Duration::days(1);
        store.insert_post(&post(author, end)).await.unwrap();

        assert!(!store.has_post_between(author, start, end).await.unwrap());
        assert!(store
            .has_post_between(author, start, end + chrono::Duration::seconds(1))
            .await
            .unwrap());
    }
}
