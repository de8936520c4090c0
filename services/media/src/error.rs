//! Errors returned by the Cloudinary client

use thiserror::Error;

/// Failure talking to the media provider
#[derive(Error, Debug)]
pub enum MediaError {
    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("Media provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with an error status or an error payload
    #[error("Media provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider answered with a body we could not interpret
    #[error("Unexpected media provider response: {0}")]
    Decode(String),
}

/// Type alias for media provider results
pub type MediaResult<T> = Result<T, MediaError>;
