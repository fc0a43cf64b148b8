use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Tracks (user, target) pairs with a request currently running, so rapid
/// repeated taps on like/claim/purchase cannot race each other.
#[derive(Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

/// Releases its key on drop.
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

fn lock(keys: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    // The set stays consistent even if a holder panicked mid-insert
    keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(action: &str, user_id: Uuid, target: &str) -> String {
        format!("{}:{}:{}", action, user_id, target)
    }

    pub fn try_acquire(&self, key: String) -> Option<InFlightGuard> {
        if !lock(&self.keys).insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            keys: self.keys.clone(),
            key,
        })
    }

    /// Like `try_acquire`, but maps a duplicate to `409 Conflict`.
    pub fn acquire(&self, action: &str, user_id: Uuid, target: &str) -> AppResult<InFlightGuard> {
        let key = Self::key(action, user_id, target);
        self.try_acquire(key).ok_or_else(|| {
            tracing::debug!(user_id = %user_id, action = %action, target = %target, "Duplicate in-flight request rejected");
            AppError::Conflict("Request already in progress".into())
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.keys).remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected_while_held() {
        let inflight = InFlight::new();
        let user = Uuid::new_v4();

        let guard = inflight.acquire("like", user, "post-1").unwrap();
        assert!(matches!(
            inflight.acquire("like", user, "post-1"),
            Err(AppError::Conflict(_))
        ));

        drop(guard);
        assert!(inflight.acquire("like", user, "post-1").is_ok());
    }

    #[test]
    fn test_different_targets_do_not_block() {
        let inflight = InFlight::new();
        let user = Uuid::new_v4();

        let _a = inflight.acquire("like", user, "post-1").unwrap();
        assert!(inflight.acquire("like", user, "post-2").is_ok());
        assert!(inflight.acquire("claim", user, "post-1").is_ok());
        assert!(inflight.acquire("like", Uuid::new_v4(), "post-1").is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let inflight = InFlight::new();
        let user = Uuid::new_v4();
        let _guard = inflight.acquire("claim", user, "checkin-20261018").unwrap();
        assert!(inflight
            .clone()
            .acquire("claim", user, "checkin-20261018")
            .is_err());
    }
}
