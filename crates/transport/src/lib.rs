//! Blob transport abstraction and backends for shelf.
//!
//! The transport channel is the durable home of chunk payloads. It imposes
//! a hard per-object size ceiling; everything above that ceiling is split
//! by the chunk codec before it reaches this crate.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemChannel;
pub use error::{TransportError, TransportResult};
pub use traits::{BlobTransport, ChunkHandle};

use shelf_core::config::TransportConfig;
use std::sync::Arc;

/// Create a blob transport from configuration.
pub async fn from_config(config: &TransportConfig) -> TransportResult<Arc<dyn BlobTransport>> {
    config.validate().map_err(TransportError::Config)?;

    match config {
        TransportConfig::Filesystem {
            path,
            max_object_size,
        } => {
            let backend = FilesystemChannel::new(path, *max_object_size).await?;
            Ok(Arc::new(backend))
        }
    }
}
