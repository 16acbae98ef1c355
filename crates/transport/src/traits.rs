//! Blob transport trait definitions.

use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a chunk stored in a transport channel.
///
/// Handles are assigned by the backend and carry no structure callers may
/// rely on; their only contract is that `fetch` with the same handle
/// returns the bytes that `send` stored.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkHandle(String);

impl ChunkHandle {
    /// Wrap a backend-assigned handle string.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The wire representation of the handle.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate a handle read back from persistent metadata.
    ///
    /// Handles never contain path separators; a separator means the
    /// metadata row was tampered with or corrupted.
    pub fn parse(s: &str) -> TransportResult<Self> {
        if s.is_empty() || s.contains('/') || s.contains('\\') || s.contains("..") {
            return Err(TransportError::InvalidHandle(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for ChunkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkHandle({})", self.0)
    }
}

impl fmt::Display for ChunkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A durable blob-carrying channel with a hard per-object size ceiling.
///
/// The channel stores opaque chunk payloads by handle; it knows nothing
/// about files, ordering, or reassembly. Sends above `max_object_size`
/// are rejected, which is what forces the chunk codec into the picture.
#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// Store one object on the channel and return its handle.
    ///
    /// The caption is advisory (mirrored into logs by backends); it is not
    /// required for retrieval.
    async fn send(&self, channel: &str, data: Bytes, caption: &str)
    -> TransportResult<ChunkHandle>;

    /// Fetch one object by handle.
    async fn fetch(&self, channel: &str, handle: &ChunkHandle) -> TransportResult<Bytes>;

    /// Delete a batch of objects. Unknown handles are skipped, matching
    /// the delete-by-message-list semantics of the upstream channel.
    async fn delete(&self, channel: &str, handles: &[ChunkHandle]) -> TransportResult<()>;

    /// The hard per-object size ceiling for this channel.
    fn max_object_size(&self) -> u64;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// Check backend connectivity and health.
    async fn health_check(&self) -> TransportResult<()>;
}
