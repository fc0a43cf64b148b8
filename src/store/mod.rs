//! Document store seams.
//!
//! Each collection gets its own repository trait; `Store` bundles them so the
//! application state can hold a single `Arc<dyn Store>`. Two backends exist:
//! Postgres (`postgres`) and an in-process map (`memory`).

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::diary::DiaryEntry;
use crate::models::post::{LikeState, Post};
use crate::models::quest::ClaimOutcome;
use crate::models::shop::{PurchaseOutcome, ShopItem};
use crate::models::user::User;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn ping(&self) -> AppResult<()>;

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Creates the profile document if missing and returns the stored one.
    async fn ensure_user(&self, id: Uuid, display_name: &str) -> AppResult<User>;
}

#[async_trait]
pub trait DiaryRepository: Send + Sync {
    async fn insert_diary(&self, entry: &DiaryEntry) -> AppResult<()>;

    async fn list_diaries(&self, user_id: Uuid) -> AppResult<Vec<DiaryEntry>>;

    /// Entries with `start <= created_at < end`, oldest first.
    async fn diaries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<DiaryEntry>>;

    async fn has_diary_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: &Post) -> AppResult<()>;

    /// Newest first.
    async fn recent_posts(&self, limit: i64) -> AppResult<Vec<Post>>;

    /// Post ids among `post_ids` that `user_id` has liked.
    async fn liked_post_ids(&self, user_id: Uuid, post_ids: &[Uuid]) -> AppResult<HashSet<Uuid>>;

    async fn has_post_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Removes the like if present, adds it otherwise. `None` when the post does not exist.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> AppResult<Option<LikeState>>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Quest ids among `quest_ids` that already carry a claim marker.
    async fn claimed_quest_ids(&self, user_id: Uuid, quest_ids: &[String])
        -> AppResult<HashSet<String>>;

    /// Atomically creates the claim marker and credits `reward`. When the marker
    /// already exists nothing is credited and `granted` is false.
    async fn claim_reward(&self, user_id: Uuid, quest_id: &str, reward: i64)
        -> AppResult<ClaimOutcome>;

    async fn owned_items(&self, user_id: Uuid) -> AppResult<Vec<String>>;

    /// Atomically deducts the price and records ownership.
    async fn purchase(&self, user_id: Uuid, item: &ShopItem) -> AppResult<PurchaseOutcome>;
}

pub trait Store: UserRepository + DiaryRepository + PostRepository + LedgerRepository {}

impl<T> Store for T where T: UserRepository + DiaryRepository + PostRepository + LedgerRepository {}
