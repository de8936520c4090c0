use anyhow::Result;
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    settings::ServerSettings,
    telemetry::init_tracing,
};
use tokio::net::TcpListener;
use tracing::info;

mod error;
mod jwt;
mod middleware;
mod models;
mod oauth;
mod rate_limiter;
mod repositories;
mod routes;
mod session;
mod state;
mod validation;

use crate::{
    jwt::{JwtConfig, JwtService},
    oauth::{OAuthClient, OAuthConfig},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
    session::SessionManager,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    // Initialize JWT service
    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    // Initialize Redis connection pool
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;

    let oauth = match OAuthConfig::from_env()? {
        Some(config) => Some(OAuthClient::new_google(config)?),
        None => {
            info!("GOOGLE_CLIENT_ID not set, Google sign-in disabled");
            None
        }
    };

    let app_state = AppState {
        user_repository: UserRepository::new(pool),
        sessions: SessionManager::new(redis_pool.clone(), jwt_service.refresh_token_expiry()),
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
        redis_pool,
        jwt_service,
        oauth,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let settings = ServerSettings::load("AUTH", 3000)?;
    let listener = TcpListener::bind(settings.address()).await?;
    info!("Authentication service listening on {}", settings.address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down authentication service");
}
