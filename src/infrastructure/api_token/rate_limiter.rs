//! Sliding window rate limiter
//!
//! Counts requests per token over the last minute.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

const WINDOW: Duration = Duration::from_secs(60);

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Requests allowed per window
    pub limit: u32,
    /// Seconds until a slot frees up
    pub reset_in_seconds: u64,
}

/// Per-key sliding window limiter
#[derive(Debug)]
pub struct RateLimiter {
    records: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    cleanup_interval: Duration,
    last_cleanup: Arc<RwLock<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            cleanup_interval: Duration::from_secs(300),
            last_cleanup: Arc::new(RwLock::new(Instant::now())),
        }
    }

    /// Check whether one more request fits, without recording it
    pub async fn check(&self, key: &str, limit: u32) -> RateLimitResult {
        let records = self.records.read().await;
        evaluate(records.get(key), limit, Instant::now())
    }

    /// Check and, when allowed, record the request
    pub async fn check_and_record(&self, key: &str, limit: u32) -> RateLimitResult {
        self.maybe_cleanup().await;

        let now = Instant::now();
        let mut records = self.records.write().await;

        let result = evaluate(records.get(key), limit, now);

        if result.allowed {
            records.entry(key.to_string()).or_default().push(now);
        }

        result
    }

    /// Forget everything recorded for a key
    pub async fn reset(&self, key: &str) {
        let mut records = self.records.write().await;
        records.remove(key);
    }

    async fn maybe_cleanup(&self) {
        let should_cleanup = {
            let last = self.last_cleanup.read().await;
            last.elapsed() >= self.cleanup_interval
        };

        if should_cleanup {
            *self.last_cleanup.write().await = Instant::now();
            self.cleanup().await;
        }
    }

    /// Drop records that fell out of the window
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let cutoff = now.checked_sub(WINDOW).unwrap_or(now);

        let mut records = self.records.write().await;
        for key_records in records.values_mut() {
            key_records.retain(|at| *at >= cutoff);
        }
        records.retain(|_, v| !v.is_empty());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate(records: Option<&Vec<Instant>>, limit: u32, now: Instant) -> RateLimitResult {
    let window_start = now.checked_sub(WINDOW).unwrap_or(now);

    let in_window: Vec<Instant> = records
        .map(|r| r.iter().copied().filter(|at| *at >= window_start).collect())
        .unwrap_or_default();
    let count = in_window.len() as u32;

    if count >= limit {
        let reset_in_seconds = in_window
            .iter()
            .min()
            .map(|oldest| {
                WINDOW
                    .as_secs()
                    .saturating_sub(now.duration_since(*oldest).as_secs())
                    .max(1)
            })
            .unwrap_or(WINDOW.as_secs());

        return RateLimitResult {
            allowed: false,
            remaining: 0,
            limit,
            reset_in_seconds,
        };
    }

    RateLimitResult {
        allowed: true,
        remaining: limit.saturating_sub(count + 1),
        limit,
        reset_in_seconds: WINDOW.as_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_first_request() {
        let limiter = RateLimiter::new();
        let result = limiter.check("1", 10).await;

        assert!(result.allowed);
        assert_eq!(result.remaining, 9);
        assert_eq!(result.limit, 10);
    }

    #[tokio::test]
    async fn test_blocks_over_limit() {
        let limiter = RateLimiter::new();

        assert!(limiter.check_and_record("1", 2).await.allowed);
        let second = limiter.check_and_record("1", 2).await;
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        let third = limiter.check_and_record("1", 2).await;
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert!(third.reset_in_seconds >= 1 && third.reset_in_seconds <= 60);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        limiter.check_and_record("1", 1).await;

        assert!(limiter.check("2", 1).await.allowed);
        assert!(!limiter.check("1", 1).await.allowed);
    }

    #[tokio::test]
    async fn test_rejected_requests_are_not_recorded() {
        let limiter = RateLimiter::new();
        limiter.check_and_record("1", 1).await;
        limiter.check_and_record("1", 1).await;
        limiter.check_and_record("1", 1).await;

        let records = limiter.records.read().await;
        assert_eq!(records.get("1").map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_reset() {
        let limiter = RateLimiter::new();
        limiter.check_and_record("1", 1).await;
        assert!(!limiter.check("1", 1).await.allowed);

        limiter.reset("1").await;
        assert!(limiter.check("1", 1).await.allowed);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_records() {
        let limiter = RateLimiter::new();
        limiter.check_and_record("1", 5).await;

        limiter.cleanup().await;

        assert_eq!(limiter.check("1", 5).await.remaining, 3);
    }
}
