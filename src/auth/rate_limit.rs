use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Window for per-user analysis limits.
pub const WINDOW_SECS: u64 = 60;

/// In-memory fixed-window limiter (single-instance deployments).
#[derive(Clone, Default)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns Ok(remaining) or Err(retry_after) when limited.
    pub async fn check_with_limits(
        &self,
        key: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(window_secs);

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.window_start));
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(max_requests - entry.count)
    }

    /// Sentiment analysis calls per user per minute.
    pub async fn check_analysis(&self, user_id: Uuid, max_per_minute: u32) -> AppResult<()> {
        let key = format!("analyze:{}", user_id);
        match self.check_with_limits(&key, max_per_minute, WINDOW_SECS).await {
            Ok(remaining) => {
                tracing::debug!(user_id = %user_id, remaining = remaining, "Analysis rate limit check passed");
                Ok(())
            }
            Err(retry_after) => {
                tracing::warn!(
                    user_id = %user_id,
                    retry_after_secs = retry_after.as_secs(),
                    "Analysis rate limit exceeded"
                );
                Err(AppError::RateLimited)
            }
        }
    }

    /// Drops entries idle for two windows; run from a background task.
    pub async fn cleanup(&self) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(WINDOW_SECS * 2);

        entries.retain(|_, entry| now.duration_since(entry.window_start) < window);
    }

    pub fn spawn_cleanup_worker(&self) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(WINDOW_SECS * 5));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limit_allows_under_limit() {
        let limiter = RateLimitState::new();
        let user = Uuid::new_v4();

        for i in 0..3 {
            let result = limiter.check_analysis(user, 3).await;
            assert!(result.is_ok(), "Request {} should be allowed", i + 1);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_over_limit() {
        let limiter = RateLimitState::new();
        let user = Uuid::new_v4();

        for _ in 0..3 {
            let _ = limiter.check_analysis(user, 3).await;
        }

        let result = limiter.check_analysis(user, 3).await;
        assert!(matches!(result, Err(AppError::RateLimited)));
    }

    #[tokio::test]
    async fn test_different_users_have_separate_limits() {
        let limiter = RateLimitState::new();

        for _ in 0..3 {
            let _ = limiter.check_analysis(Uuid::new_v4(), 1).await;
        }

        assert!(limiter.check_analysis(Uuid::new_v4(), 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_entries() {
        let limiter = RateLimitState::new();
        let _ = limiter.check_with_limits("fresh", 5, WINDOW_SECS).await;
        limiter.cleanup().await;
        assert_eq!(limiter.len().await, 1);
    }
}
