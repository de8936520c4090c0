//! Session management using Redis
//!
//! One refresh session per user: the current refresh token is stored under
//! the user's id, so signing in elsewhere replaces the previous session.

use anyhow::Result;
use common::cache::RedisPool;
use tracing::info;
use uuid::Uuid;

/// Session manager for handling user sessions in Redis
#[derive(Clone)]
pub struct SessionManager {
    redis_pool: RedisPool,
    ttl_seconds: u64,
}

impl SessionManager {
    /// Create a new session manager; sessions live as long as refresh tokens
    pub fn new(redis_pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            redis_pool,
            ttl_seconds,
        }
    }

    fn key(user_id: Uuid) -> String {
        format!("session:{}", user_id)
    }

    /// Store `refresh_token` as the user's current session
    pub async fn store(&self, user_id: Uuid, refresh_token: &str) -> Result<()> {
        info!("Storing session for user: {}", user_id);
        self.redis_pool
            .set(&Self::key(user_id), refresh_token, Some(self.ttl_seconds))
            .await
    }

    /// Check that `refresh_token` is the user's current session
    pub async fn is_current(&self, user_id: Uuid, refresh_token: &str) -> Result<bool> {
        let stored = self.redis_pool.get(&Self::key(user_id)).await?;
        Ok(stored.as_deref() == Some(refresh_token))
    }

    /// Delete the session for a user
    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        info!("Deleting session for user: {}", user_id);
        self.redis_pool.delete(&Self::key(user_id)).await
    }
}
