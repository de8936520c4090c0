//! Cloudinary account configuration

use anyhow::Result;
use std::env;

/// Credentials and endpoints for the Cloudinary account
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// Cloud name, the first path segment of every API and delivery URL
    pub cloud_name: String,
    /// Public API key, sent alongside signed requests
    pub api_key: String,
    /// API secret used to sign requests; never leaves the server
    pub api_secret: String,
    /// Upload/admin API base (default: "https://api.cloudinary.com")
    pub api_base: String,
    /// Delivery base for transformation URLs (default: "https://res.cloudinary.com")
    pub delivery_base: String,
}

impl CloudinaryConfig {
    /// Create a new CloudinaryConfig from environment variables
    ///
    /// # Environment Variables
    /// - `CLOUDINARY_CLOUD_NAME`: Cloud name (required)
    /// - `CLOUDINARY_API_KEY`: API key (required)
    /// - `CLOUDINARY_API_SECRET`: API secret (required)
    /// - `CLOUDINARY_API_BASE`: API base URL (default: "https://api.cloudinary.com")
    /// - `CLOUDINARY_DELIVERY_BASE`: Delivery base URL (default: "https://res.cloudinary.com")
    pub fn from_env() -> Result<Self> {
        let cloud_name = required("CLOUDINARY_CLOUD_NAME")?;
        let api_key = required("CLOUDINARY_API_KEY")?;
        let api_secret = required("CLOUDINARY_API_SECRET")?;

        let api_base = env::var("CLOUDINARY_API_BASE")
            .unwrap_or_else(|_| "https://api.cloudinary.com".to_string());
        let delivery_base = env::var("CLOUDINARY_DELIVERY_BASE")
            .unwrap_or_else(|_| "https://res.cloudinary.com".to_string());

        Ok(CloudinaryConfig {
            cloud_name,
            api_key,
            api_secret,
            api_base: api_base.trim_end_matches('/').to_string(),
            delivery_base: delivery_base.trim_end_matches('/').to_string(),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} environment variable not set", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cloudinary_config_from_env() {
        unsafe {
            env::set_var("CLOUDINARY_CLOUD_NAME", "demo");
            env::set_var("CLOUDINARY_API_KEY", "1234");
            env::set_var("CLOUDINARY_API_SECRET", "secret");
            env::set_var("CLOUDINARY_DELIVERY_BASE", "https://cdn.example.com/");
            env::remove_var("CLOUDINARY_API_BASE");
        }

        let config = CloudinaryConfig::from_env().unwrap();
        assert_eq!(config.cloud_name, "demo");
        assert_eq!(config.api_base, "https://api.cloudinary.com");
        assert_eq!(config.delivery_base, "https://cdn.example.com");

        unsafe {
            env::remove_var("CLOUDINARY_CLOUD_NAME");
            env::remove_var("CLOUDINARY_API_KEY");
            env::remove_var("CLOUDINARY_API_SECRET");
            env::remove_var("CLOUDINARY_DELIVERY_BASE");
        }
    }

    #[test]
    #[serial]
    fn test_cloudinary_config_requires_secret() {
        unsafe {
            env::set_var("CLOUDINARY_CLOUD_NAME", "demo");
            env::set_var("CLOUDINARY_API_KEY", "1234");
            env::remove_var("CLOUDINARY_API_SECRET");
        }

        let err = CloudinaryConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("CLOUDINARY_API_SECRET"));

        unsafe {
            env::remove_var("CLOUDINARY_CLOUD_NAME");
            env::remove_var("CLOUDINARY_API_KEY");
        }
    }
}
