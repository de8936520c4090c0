//! Custom error types for the common library
//!
//! This module defines the error types shared by every Frameo service.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised while loading keys or verifying session tokens
#[derive(Error, Debug)]
pub enum TokenError {
    /// A required environment variable is missing
    #[error("{0} environment variable not set")]
    MissingVariable(&'static str),

    /// Key material could not be read from disk
    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The token (or key) was rejected by jsonwebtoken
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    /// A refresh token was presented where an access token is required, or vice versa
    #[error("Unexpected token type")]
    WrongType,
}
