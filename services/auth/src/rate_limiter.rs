//! Rate limiter for preventing brute force attacks on login
//!
//! Only failed attempts count. A key that fails `max_failures` times within
//! the window is locked out for the ban duration; a successful login clears
//! its history.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed attempts allowed inside one window
    pub max_failures: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,       // 5 minutes
            ban_duration_seconds: 900, // 15 minutes
        }
    }
}

#[derive(Debug)]
struct FailureRecord {
    failures: u32,
    window_start: Instant,
    banned_until: Option<Instant>,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    records: Arc<Mutex<HashMap<String, FailureRecord>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `key` may attempt a login right now
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut records = self.records.lock().await;
        let now = Instant::now();
        self.prune(&mut records, now);

        let banned_until = match records.get(key) {
            Some(record) => record.banned_until,
            None => return true,
        };

        match banned_until {
            Some(until) if now < until => false,
            Some(_) => {
                records.remove(key);
                true
            }
            None => true,
        }
    }

    /// Record a failed attempt for `key`
    pub async fn record_failure(&self, key: &str) {
        let mut records = self.records.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);
        self.prune(&mut records, now);

        let record = records.entry(key.to_string()).or_insert(FailureRecord {
            failures: 0,
            window_start: now,
            banned_until: None,
        });

        if now.duration_since(record.window_start) >= window {
            record.failures = 0;
            record.window_start = now;
        }

        record.failures += 1;
        if record.failures >= self.config.max_failures && record.banned_until.is_none() {
            record.banned_until = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Locked out {} for {} seconds after {} failed logins",
                key, self.config.ban_duration_seconds, record.failures
            );
        }
    }

    /// Drop records whose window and ban have both run out
    fn prune(&self, records: &mut HashMap<String, FailureRecord>, now: Instant) {
        let window = Duration::from_secs(self.config.window_seconds);
        records.retain(|_, record| {
            let banned = record.banned_until.is_some_and(|until| now < until);
            banned || now.duration_since(record.window_start) < window
        });
    }

    /// Forget the failure history of `key`
    pub async fn reset(&self, key: &str) {
        if self.records.lock().await.remove(key).is_some() {
            info!("Cleared failed login history for {}", key);
        }
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_failures: u32, ban_duration_seconds: u64) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_failures,
            window_seconds: 300,
            ban_duration_seconds,
        })
    }

    #[tokio::test]
    async fn test_locks_out_after_max_failures() {
        let limiter = limiter(3, 60);

        for _ in 0..2 {
            limiter.record_failure("ada@example.com").await;
            assert!(limiter.is_allowed("ada@example.com").await);
        }
        limiter.record_failure("ada@example.com").await;
        assert!(!limiter.is_allowed("ada@example.com").await);

        // other keys are unaffected
        assert!(limiter.is_allowed("bob@example.com").await);
    }

    #[tokio::test]
    async fn test_reset_clears_failures() {
        let limiter = limiter(2, 60);

        limiter.record_failure("ada@example.com").await;
        limiter.reset("ada@example.com").await;
        limiter.record_failure("ada@example.com").await;
        assert!(limiter.is_allowed("ada@example.com").await);
    }

    #[tokio::test]
    async fn test_stale_records_are_pruned() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_failures: 5,
            window_seconds: 0,
            ban_duration_seconds: 60,
        });

        for i in 0..1000 {
            limiter.record_failure(&format!("user{i}@example.com")).await;
        }
        assert!(limiter.is_allowed("user0@example.com").await);
        assert!(limiter.records.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_active_ban_survives_pruning() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_failures: 1,
            window_seconds: 0,
            ban_duration_seconds: 60,
        });

        limiter.record_failure("ada@example.com").await;
        limiter.record_failure("bob@example.com").await;
        assert!(!limiter.is_allowed("ada@example.com").await);
        assert_eq!(limiter.records.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_ban_expires() {
        let limiter = limiter(1, 0);

        limiter.record_failure("ada@example.com").await;
        assert!(limiter.is_allowed("ada@example.com").await);
    }
}
