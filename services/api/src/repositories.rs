//! Repositories for database operations

pub mod video;

pub use video::{VideoRepository, VideoStore};
