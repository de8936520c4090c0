use anyhow::Result;
use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    settings::ServerSettings,
    telemetry::init_tracing,
    token::TokenVerifier,
};
use media::{AvailabilityPoller, CloudinaryClient, CloudinaryConfig, HttpProbe};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

mod config;
mod error;
mod gallery;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;

use crate::{config::ApiConfig, repositories::VideoRepository, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting API service");

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

    let config = ApiConfig::from_env();
    let cloudinary = CloudinaryClient::new(CloudinaryConfig::from_env()?);
    let poller = AvailabilityPoller::new(
        Arc::new(HttpProbe::new(reqwest::Client::new())),
        config.poll_interval,
    );

    let app_state = AppState {
        verifier: TokenVerifier::from_env()?,
        videos: Arc::new(VideoRepository::new(pool)),
        assets: Arc::new(cloudinary.clone()),
        cloudinary,
        poller,
        config,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let settings = ServerSettings::load("API", 3001)?;
    let listener = TcpListener::bind(settings.address()).await?;
    info!("API service listening on {}", settings.address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down API service");
}
