//! In-memory transport with failure injection for orchestrator tests.

use async_trait::async_trait;
use bytes::Bytes;
use shelf_transport::{BlobTransport, ChunkHandle, TransportError, TransportResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// A memory-backed channel. `fail_after_sends` makes every send past the
/// given count fail, for exercising mid-upload abort paths;
/// `fail_first_deletes` makes the first N delete calls fail, for
/// exercising best-effort removal sweeps.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct MemoryTransport {
    objects: Mutex<HashMap<String, Bytes>>,
    max_object_size: u64,
    sends: AtomicUsize,
    fail_after_sends: usize,
    deletes: AtomicUsize,
    fail_first_deletes: usize,
}

#[allow(dead_code)]
impl MemoryTransport {
    pub fn new(max_object_size: u64) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            max_object_size,
            sends: AtomicUsize::new(0),
            fail_after_sends: usize::MAX,
            deletes: AtomicUsize::new(0),
            fail_first_deletes: 0,
        }
    }

    pub fn failing_after(max_object_size: u64, fail_after_sends: usize) -> Self {
        Self {
            fail_after_sends,
            ..Self::new(max_object_size)
        }
    }

    pub fn failing_deletes(max_object_size: u64, fail_first_deletes: usize) -> Self {
        Self {
            fail_first_deletes,
            ..Self::new(max_object_size)
        }
    }

    /// Number of objects currently held on the channel.
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobTransport for MemoryTransport {
    async fn send(&self, _channel: &str, data: Bytes, _caption: &str) -> TransportResult<ChunkHandle> {
        let size = data.len() as u64;
        if size > self.max_object_size {
            return Err(TransportError::ObjectTooLarge {
                size,
                max: self.max_object_size,
            });
        }
        let sent = self.sends.fetch_add(1, Ordering::SeqCst);
        if sent >= self.fail_after_sends {
            return Err(TransportError::Io(std::io::Error::other("injected send failure")));
        }
        let handle = ChunkHandle::new(Uuid::new_v4().to_string());
        self.objects
            .lock()
            .unwrap()
            .insert(handle.as_str().to_string(), data);
        Ok(handle)
    }

    async fn fetch(&self, _channel: &str, handle: &ChunkHandle) -> TransportResult<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| TransportError::NotFound(handle.as_str().to_string()))
    }

    async fn delete(&self, _channel: &str, handles: &[ChunkHandle]) -> TransportResult<()> {
        let seen = self.deletes.fetch_add(1, Ordering::SeqCst);
        if seen < self.fail_first_deletes {
            return Err(TransportError::Io(std::io::Error::other(
                "injected delete failure",
            )));
        }
        let mut objects = self.objects.lock().unwrap();
        for handle in handles {
            objects.remove(handle.as_str());
        }
        Ok(())
    }

    fn max_object_size(&self) -> u64 {
        self.max_object_size
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> TransportResult<()> {
        Ok(())
    }
}
