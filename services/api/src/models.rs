//! API models for request and response payloads

pub mod video;

pub use video::{NewVideo, SaveVideoRequest, Video, VideoView};
