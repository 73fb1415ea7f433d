//! Rate limiting for outbound chat requests
//!
//! Guards the generative AI API with a trailing-window request cap and a
//! cooldown that kicks in when the upstream reports quota exhaustion.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::ChatbotConfig;
use crate::error::AppError;

#[derive(Debug, Default)]
struct LimiterState {
    /// Start times of requests issued in the trailing window, oldest first
    timestamps: VecDeque<Instant>,
    quota_exhausted: bool,
    quota_reset_at: Option<Instant>,
}

impl LimiterState {
    fn prune(&mut self, window: Duration, now: Instant) -> usize {
        let before = self.timestamps.len();
        while let Some(oldest) = self.timestamps.front() {
            if now.duration_since(*oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        before - self.timestamps.len()
    }
}

/// Process-wide limiter for chat requests
///
/// All state sits behind a single lock; it is not persisted and starts
/// empty on every process start.
pub struct ChatRateLimiter {
    state: Mutex<LimiterState>,
    /// Maximum requests per window
    max_requests: usize,
    /// Trailing window length
    window: Duration,
    /// How long to back off after the upstream reports an exhausted quota
    cooldown: Duration,
}

impl ChatRateLimiter {
    /// Create new rate limiter
    ///
    /// # Arguments
    /// * `max_requests` - Maximum requests per window
    /// * `window` - Trailing window length
    /// * `cooldown` - Back-off after upstream quota exhaustion
    pub fn new(max_requests: usize, window: Duration, cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(LimiterState::default()),
            max_requests: max_requests.max(1),
            window,
            cooldown,
        }
    }

    pub fn from_config(config: &ChatbotConfig) -> Self {
        Self::new(
            config.max_requests_per_window,
            Duration::from_secs(config.window_seconds),
            Duration::from_secs(config.quota_cooldown_seconds),
        )
    }

    /// Check whether a request may go out, and record it if so
    ///
    /// # Returns
    /// Ok if allowed, `AppError::RateLimited` otherwise
    pub async fn check_and_record(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if state.quota_exhausted {
            match state.quota_reset_at {
                Some(reset_at) if reset_at > now => {
                    let remaining = ceil_seconds(reset_at - now);
                    return Err(AppError::RateLimited {
                        message: format!(
                            "AI quota exhausted. Please try again in {} seconds.",
                            remaining
                        ),
                        retry_after: remaining,
                    });
                }
                _ => {
                    tracing::info!("Chat quota cooldown elapsed, resuming requests");
                    state.quota_exhausted = false;
                    state.quota_reset_at = None;
                }
            }
        }

        state.prune(self.window, now);

        if state.timestamps.len() >= self.max_requests {
            return Err(AppError::RateLimited {
                message: "Too many chat requests. Please wait a minute and try again.".to_string(),
                retry_after: self.window.as_secs(),
            });
        }

        state.timestamps.push_back(now);
        Ok(())
    }

    /// Enter the cooldown after the upstream answered 429
    pub async fn mark_quota_exhausted(&self) {
        let mut state = self.state.lock().await;
        state.quota_exhausted = true;
        state.quota_reset_at = Some(Instant::now() + self.cooldown);
        tracing::warn!(
            cooldown_seconds = self.cooldown.as_secs(),
            "Chat quota exhausted upstream"
        );
    }

    /// Clear any quota flag after a successful upstream call
    pub async fn mark_success(&self) {
        let mut state = self.state.lock().await;
        state.quota_exhausted = false;
        state.quota_reset_at = None;
    }

    /// Prune old entries
    ///
    /// Called periodically from a timer task.
    pub async fn prune_old(&self) {
        let mut state = self.state.lock().await;
        let removed = state.prune(self.window, Instant::now());

        if removed > 0 {
            tracing::debug!("Pruned {} old chat rate limit entries", removed);
        }
    }

    /// Get rate limiter statistics
    pub async fn stats(&self) -> ChatRateLimitStats {
        let state = self.state.lock().await;
        let now = Instant::now();
        let requests_in_window = state
            .timestamps
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count();
        let seconds_until_reset = state
            .quota_reset_at
            .filter(|reset_at| state.quota_exhausted && *reset_at > now)
            .map(|reset_at| ceil_seconds(reset_at - now));

        ChatRateLimitStats {
            requests_in_window,
            max_requests: self.max_requests,
            window_seconds: self.window.as_secs(),
            quota_exhausted: state.quota_exhausted,
            seconds_until_reset,
        }
    }
}

fn ceil_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

/// Rate limiter statistics
#[derive(Debug, Clone, Serialize)]
pub struct ChatRateLimitStats {
    /// Requests recorded in the trailing window
    pub requests_in_window: usize,
    /// Maximum requests per window
    pub max_requests: usize,
    /// Window duration in seconds
    pub window_seconds: u64,
    pub quota_exhausted: bool,
    /// Seconds left in the quota cooldown, if one is active
    pub seconds_until_reset: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limit() {
        let limiter = ChatRateLimiter::new(10, Duration::from_secs(1), Duration::from_secs(60));

        for _ in 0..10 {
            assert!(limiter.check_and_record().await.is_ok());
        }

        // 11th request inside the window is refused
        match limiter.check_and_record().await {
            Err(AppError::RateLimited { retry_after, .. }) => assert_eq!(retry_after, 1),
            other => panic!("expected RateLimited, got {:?}", other),
        }

        // Wait for window to pass
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(limiter.check_and_record().await.is_ok());
    }

    #[tokio::test]
    async fn test_quota_cooldown() {
        let limiter = ChatRateLimiter::new(10, Duration::from_secs(60), Duration::from_secs(1));

        limiter.mark_quota_exhausted().await;
        match limiter.check_and_record().await {
            Err(AppError::RateLimited { retry_after, .. }) => assert_eq!(retry_after, 1),
            other => panic!("expected RateLimited, got {:?}", other),
        }

        let stats = limiter.stats().await;
        assert!(stats.quota_exhausted);
        assert_eq!(stats.seconds_until_reset, Some(1));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(limiter.check_and_record().await.is_ok());
        let stats = limiter.stats().await;
        assert!(!stats.quota_exhausted);
        assert_eq!(stats.requests_in_window, 1);
    }

    #[tokio::test]
    async fn test_success_clears_exhaustion() {
        let limiter = ChatRateLimiter::new(10, Duration::from_secs(60), Duration::from_secs(60));

        limiter.mark_quota_exhausted().await;
        limiter.mark_success().await;

        assert!(limiter.check_and_record().await.is_ok());
        assert!(limiter.stats().await.seconds_until_reset.is_none());
    }

    #[tokio::test]
    async fn test_prune_old() {
        let limiter = ChatRateLimiter::new(5, Duration::from_millis(50), Duration::from_secs(60));

        limiter.check_and_record().await.unwrap();
        limiter.check_and_record().await.unwrap();
        assert_eq!(limiter.stats().await.requests_in_window, 2);

        tokio::time::sleep(Duration::from_millis(80)).await;
        limiter.prune_old().await;

        let stats = limiter.stats().await;
        assert_eq!(stats.requests_in_window, 0);
        assert_eq!(stats.max_requests, 5);
    }

    #[test]
    fn test_ceil_seconds() {
        assert_eq!(ceil_seconds(Duration::from_millis(1)), 1);
        assert_eq!(ceil_seconds(Duration::from_millis(59_001)), 60);
        assert_eq!(ceil_seconds(Duration::from_secs(60)), 60);
    }
}
