//! Metadata store error types.

use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

/// Parse a wire identifier into an internal id.
///
/// Ids round-trip through their string representation at the service
/// boundary; anything that is not a well-formed UUID is rejected here so
/// malformed input never reaches a query.
pub fn parse_id(s: &str) -> MetadataResult<uuid::Uuid> {
    uuid::Uuid::parse_str(s).map_err(|_| MetadataError::InvalidId(s.to_string()))
}
