//! Local filesystem transport channel.

use crate::error::{TransportError, TransportResult};
use crate::traits::{BlobTransport, ChunkHandle};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Filesystem-backed channel: one directory per channel, one file per
/// chunk, handles are generated UUIDs.
pub struct FilesystemChannel {
    root: PathBuf,
    max_object_size: u64,
}

impl FilesystemChannel {
    /// Create a new filesystem channel rooted at `root`.
    pub async fn new(root: impl AsRef<Path>, max_object_size: u64) -> TransportResult<Self> {
        if max_object_size == 0 {
            return Err(TransportError::Config(
                "max_object_size must be greater than zero".to_string(),
            ));
        }
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            max_object_size,
        })
    }

    /// Resolve the object path for a handle, rejecting anything that could
    /// escape the channel directory.
    fn object_path(&self, channel: &str, handle: &ChunkHandle) -> TransportResult<PathBuf> {
        if channel.is_empty() || channel.contains('/') || channel.contains("..") {
            return Err(TransportError::Config(format!(
                "invalid channel name: {channel}"
            )));
        }
        // Handles were validated at parse/creation time; re-check here so a
        // handle constructed via `new` cannot traverse either.
        let handle = ChunkHandle::parse(handle.as_str())?;
        Ok(self.root.join(channel).join(handle.as_str()))
    }
}

#[async_trait]
impl BlobTransport for FilesystemChannel {
    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len(), caption))]
    async fn send(
        &self,
        channel: &str,
        data: Bytes,
        caption: &str,
    ) -> TransportResult<ChunkHandle> {
        if data.len() as u64 > self.max_object_size {
            return Err(TransportError::ObjectTooLarge {
                size: data.len() as u64,
                max: self.max_object_size,
            });
        }

        let handle = ChunkHandle::new(Uuid::new_v4().to_string());
        let path = self.object_path(channel, &handle)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temp file, fsync, then rename so a crashed send never
        // leaves a partial object behind a valid handle.
        let temp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &path).await?;

        tracing::debug!(handle = %handle, caption, "chunk stored");
        Ok(handle)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn fetch(&self, channel: &str, handle: &ChunkHandle) -> TransportResult<Bytes> {
        let path = self.object_path(channel, handle)?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransportError::NotFound(handle.to_string())
            } else {
                TransportError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self, handles), fields(backend = "filesystem", count = handles.len()))]
    async fn delete(&self, channel: &str, handles: &[ChunkHandle]) -> TransportResult<()> {
        for handle in handles {
            let path = self.object_path(channel, handle)?;
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(handle = %handle, "chunk already absent, skipping");
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(())
    }

    fn max_object_size(&self) -> u64 {
        self.max_object_size
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> TransportResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            TransportError::Io(std::io::Error::new(
                e.kind(),
                format!("channel root not accessible: {e}"),
            ))
        })?;
        if !metadata.is_dir() {
            return Err(TransportError::Config(format!(
                "channel root is not a directory: {:?}",
                self.root
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn channel() -> (tempfile::TempDir, FilesystemChannel) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemChannel::new(dir.path(), 1024).await.unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn test_send_fetch_roundtrip() {
        let (_dir, backend) = channel().await;
        let data = Bytes::from_static(b"hello world");

        let handle = backend.send("files", data.clone(), "a.txt - 1/1").await.unwrap();
        let fetched = backend.fetch("files", &handle).await.unwrap();
        assert_eq!(fetched, data);
    }

    #[tokio::test]
    async fn test_send_rejects_oversized_object() {
        let (_dir, backend) = channel().await;
        let data = Bytes::from(vec![0u8; 2048]);

        match backend.send("files", data, "big").await {
            Err(TransportError::ObjectTooLarge { size, max }) => {
                assert_eq!(size, 2048);
                assert_eq!(max, 1024);
            }
            other => panic!("expected ObjectTooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_unknown_handle() {
        let (_dir, backend) = channel().await;
        let handle = ChunkHandle::new(Uuid::new_v4().to_string());
        assert!(matches!(
            backend.fetch("files", &handle).await,
            Err(TransportError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_skips_missing_handles() {
        let (_dir, backend) = channel().await;
        let stored = backend
            .send("files", Bytes::from_static(b"x"), "")
            .await
            .unwrap();
        let missing = ChunkHandle::new(Uuid::new_v4().to_string());

        backend
            .delete("files", &[missing, stored.clone()])
            .await
            .unwrap();
        assert!(backend.fetch("files", &stored).await.is_err());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, backend) = channel().await;
        let evil = ChunkHandle::new("../escape");
        assert!(matches!(
            backend.fetch("files", &evil).await,
            Err(TransportError::InvalidHandle(_))
        ));
        assert!(ChunkHandle::parse("..").is_err());
        assert!(ChunkHandle::parse("a/b").is_err());
        assert!(ChunkHandle::parse("").is_err());
    }
}
