//! Application state shared across handlers

use common::token::TokenVerifier;
use media::{AssetStore, AvailabilityPoller, CloudinaryClient, UrlBuilder};
use std::sync::Arc;

use crate::{config::ApiConfig, repositories::VideoStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub verifier: TokenVerifier,
    pub videos: Arc<dyn VideoStore>,
    /// Where assets are destroyed; the Cloudinary client outside of tests
    pub assets: Arc<dyn AssetStore>,
    pub cloudinary: CloudinaryClient,
    pub poller: AvailabilityPoller,
    pub config: ApiConfig,
}

impl AppState {
    pub fn urls(&self) -> UrlBuilder {
        self.cloudinary.urls()
    }
}
