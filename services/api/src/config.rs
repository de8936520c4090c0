//! API service limits and polling configuration

use std::env;
use std::time::Duration;

/// Limits applied to uploads and availability polling
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Largest accepted video upload in bytes (default: 60 MB)
    pub max_video_upload_bytes: usize,
    /// Largest accepted image upload in bytes (default: 10 MB)
    pub max_image_upload_bytes: usize,
    /// Delay between availability probes (default: 2 seconds)
    pub poll_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_video_upload_bytes: 60 * 1024 * 1024,
            max_image_upload_bytes: 10 * 1024 * 1024,
            poll_interval: media::poller::DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MAX_VIDEO_UPLOAD_BYTES`: Video upload limit (default: 62914560)
    /// - `MAX_IMAGE_UPLOAD_BYTES`: Image upload limit (default: 10485760)
    /// - `POLL_INTERVAL_MS`: Availability probe interval (default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_video_upload_bytes: parse_var("MAX_VIDEO_UPLOAD_BYTES")
                .unwrap_or(defaults.max_video_upload_bytes),
            max_image_upload_bytes: parse_var("MAX_IMAGE_UPLOAD_BYTES")
                .unwrap_or(defaults.max_image_upload_bytes),
            poll_interval: parse_var("POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        }
    }

    /// Request body cap; leaves room for the other multipart fields
    pub fn body_limit(&self) -> usize {
        self.max_video_upload_bytes.max(self.max_image_upload_bytes) + 1024 * 1024
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
