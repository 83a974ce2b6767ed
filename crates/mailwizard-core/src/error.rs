//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// DNS lookup failed.
    #[error("DNS error: {0}")]
    Resolve(#[from] hickory_resolver::error::ResolveError),

    /// Email address has no usable domain part.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
