//! Application state shared across handlers

use common::cache::RedisPool;
use crate::{
    jwt::JwtService, oauth::OAuthClient, rate_limiter::RateLimiter,
    repositories::UserRepository, session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub rate_limiter: RateLimiter,
    pub sessions: SessionManager,
    /// `None` when Google sign-in is not configured
    pub oauth: Option<OAuthClient>,
}
