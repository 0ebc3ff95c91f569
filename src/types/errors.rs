//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.
//!
//! Errors are reserved for genuine API-boundary failures (hierarchy fetch,
//! wallet misuse, config I/O). Lease acceptance outcomes are never errors:
//! they are [`crate::validator::LeaseUseStatus`] codes, because callers must
//! always be able to produce a well-formed response.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the lease core.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation errors (map to gRPC INVALID_ARGUMENT).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (map to gRPC NOT_FOUND).
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource tree fetch failures (map to gRPC UNAVAILABLE).
    #[error("hierarchy fetch failed: {0}")]
    Fetch(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }
}
