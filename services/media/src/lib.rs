//! Media provider integration for Frameo
//!
//! All processing (compression, smart cropping, previews, format
//! conversion) happens at the provider. This crate covers:
//! - signing direct browser uploads ([`signature`])
//! - server-side uploads and asset removal ([`client`])
//! - building transformation URLs ([`transform`])
//! - waiting for lazily generated transformations ([`poller`])
//! - gallery display helpers ([`format`])
//!
//! # Example
//!
//! ```
//! use media::transform::{CropFormat, UrlBuilder};
//!
//! let urls = UrlBuilder::new("https://res.cloudinary.com", "demo");
//! let url = urls.cropped_video("video-uploads/clip", CropFormat::Square);
//! assert!(url.ends_with("/c_fill,g_auto,ar_1:1/video-uploads/clip.mp4"));
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod poller;
pub mod signature;
pub mod transform;

pub use client::{AssetStore, CloudinaryClient, DestroyOutcome, UploadedAsset};
pub use config::CloudinaryConfig;
pub use error::{MediaError, MediaResult};
pub use poller::{AvailabilityPoller, HttpProbe, PollStatus, PollTask, Probe};
pub use signature::{UploadKind, UploadSignature};
pub use transform::{CropFormat, ResourceType, SocialFormat, UrlBuilder};
