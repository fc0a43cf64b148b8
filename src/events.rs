//! State-change events fanned out to WebSocket subscribers.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

pub const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    DiarySaved {
        user_id: Uuid,
        diary_id: Uuid,
    },
    PostCreated {
        user_id: Uuid,
        post_id: Uuid,
    },
    PostLiked {
        user_id: Uuid,
        post_id: Uuid,
        liked: bool,
        like_count: i64,
    },
    QuestClaimed {
        user_id: Uuid,
        quest_id: String,
        reward: i64,
    },
    BalanceChanged {
        user_id: Uuid,
        balance: i64,
    },
}

impl AppEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            AppEvent::DiarySaved { user_id, .. }
            | AppEvent::PostCreated { user_id, .. }
            | AppEvent::PostLiked { user_id, .. }
            | AppEvent::QuestClaimed { user_id, .. }
            | AppEvent::BalanceChanged { user_id, .. } => *user_id,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Fire-and-forget; having no subscribers is not an error.
    pub fn publish(&self, event: AppEvent) {
        let receivers = self.tx.send(event).unwrap_or(0);
        tracing::trace!(receivers, "Event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
