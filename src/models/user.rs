use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub coins: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub coins: i64,
    pub owned_items: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user: User, owned_items: Vec<String>) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            coins: user.coins,
            owned_items,
            created_at: user.created_at,
        }
    }
}
