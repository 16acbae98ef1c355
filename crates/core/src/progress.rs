//! Per-transfer progress accounting.
//!
//! Progress is scoped to a single upload or download: the caller hands a
//! [`TransferProgress`] handle to the orchestrator and keeps a clone, so
//! cumulative bytes can be observed from another task while the transfer
//! runs. Counts are continuous across chunk boundaries (offset by
//! `chunk_index * max_chunk_size`) rather than resetting per chunk.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Progress handle for one transfer, cheap to clone and share. Clones
/// observe the same counters.
#[derive(Clone, Debug, Default)]
pub struct TransferProgress {
    total: Arc<AtomicU64>,
    transferred: Arc<AtomicU64>,
}

impl TransferProgress {
    /// Create a progress handle for a transfer of `total` bytes.
    pub fn new(total: u64) -> Self {
        let progress = Self::default();
        progress.begin(total);
        progress
    }

    /// Start a transfer of `total` bytes, resetting the counter. Bulk
    /// operations call this once per item on the same handle.
    pub fn begin(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.transferred.store(0, Ordering::Relaxed);
    }

    /// Total byte count of the transfer in flight.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Cumulative bytes transferred so far.
    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Record progress within a chunk.
    ///
    /// `within_chunk` is the byte position inside chunk `chunk_index`; the
    /// cumulative count is offset by previously completed chunks so the
    /// reported value never resets at a chunk boundary. Monotonic: stale
    /// updates never move the counter backwards.
    pub fn advance(&self, chunk_index: usize, max_chunk_size: u64, within_chunk: u64) {
        let cumulative = (chunk_index as u64)
            .saturating_mul(max_chunk_size)
            .saturating_add(within_chunk)
            .min(self.total());
        self.transferred.fetch_max(cumulative, Ordering::Relaxed);
    }

    /// Mark the whole transfer complete.
    pub fn finish(&self) {
        self.transferred.fetch_max(self.total(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuous_across_chunks() {
        let progress = TransferProgress::new(100);
        progress.advance(0, 30, 30);
        assert_eq!(progress.transferred(), 30);
        progress.advance(1, 30, 10);
        assert_eq!(progress.transferred(), 40);
        progress.advance(3, 30, 10);
        assert_eq!(progress.transferred(), 100); // clamped to total
    }

    #[test]
    fn test_monotonic() {
        let progress = TransferProgress::new(100);
        progress.advance(2, 30, 0);
        assert_eq!(progress.transferred(), 60);
        progress.advance(0, 30, 5); // stale update
        assert_eq!(progress.transferred(), 60);
    }

    #[test]
    fn test_finish() {
        let progress = TransferProgress::new(42);
        progress.finish();
        assert_eq!(progress.transferred(), 42);
    }

    #[test]
    fn test_clones_observe_shared_counters() {
        let progress = TransferProgress::default();
        let observer = progress.clone();

        progress.begin(80);
        progress.advance(0, 40, 40);
        assert_eq!(observer.total(), 80);
        assert_eq!(observer.transferred(), 40);

        // A new item on the same handle resets the counter.
        progress.begin(10);
        assert_eq!(observer.transferred(), 0);
        assert_eq!(observer.total(), 10);
    }
}
