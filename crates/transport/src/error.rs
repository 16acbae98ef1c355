//! Transport error types.

use thiserror::Error;

/// Blob transport operation errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chunk not found: {0}")]
    NotFound(String),

    #[error("invalid chunk handle: {0}")]
    InvalidHandle(String),

    #[error("object size {size} exceeds channel ceiling {max}")]
    ObjectTooLarge { size: u64, max: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;
