//! Chunk codec: split oversized payloads into transport-sized pieces and
//! losslessly reassemble them.
//!
//! The codec is stateless and carries no framing; callers are responsible
//! for preserving chunk order end-to-end (the transfer orchestrator keeps
//! handles in send order and fetches in stored order).

use crate::error::{Error, Result};
use bytes::Bytes;

/// Split `data` into chunks of at most `max_chunk_size` bytes.
///
/// Every chunk except possibly the last has length exactly
/// `max_chunk_size`; no chunk is ever empty. Empty input yields zero
/// chunks.
pub fn split(data: &Bytes, max_chunk_size: u64) -> Result<Vec<Bytes>> {
    if max_chunk_size == 0 {
        return Err(Error::InvalidChunkSize(max_chunk_size));
    }
    let max = usize::try_from(max_chunk_size).map_err(|_| Error::InvalidChunkSize(max_chunk_size))?;

    let mut chunks = Vec::with_capacity(data.len().div_ceil(max.max(1)));
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + max).min(data.len());
        // Bytes::slice is a refcount bump, not a copy.
        chunks.push(data.slice(offset..end));
        offset = end;
    }
    Ok(chunks)
}

/// Reassemble chunks by in-order concatenation.
pub fn join(chunks: &[Bytes]) -> Bytes {
    let total: usize = chunks.iter().map(|c| c.len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    Bytes::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let data = Bytes::from(vec![7u8; 100]);
        let chunks = split(&data, 30).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].len(), 30);
        assert_eq!(chunks[1].len(), 30);
        assert_eq!(chunks[2].len(), 30);
        assert_eq!(chunks[3].len(), 10); // Last chunk is smaller
    }

    #[test]
    fn test_split_exact_multiple() {
        let data = Bytes::from(vec![1u8; 90]);
        let chunks = split(&data, 30).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 30));
    }

    #[test]
    fn test_split_empty_input() {
        let chunks = split(&Bytes::new(), 16).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_split_rejects_zero_chunk_size() {
        let data = Bytes::from_static(b"abc");
        assert!(matches!(split(&data, 0), Err(Error::InvalidChunkSize(0))));
    }

    #[test]
    fn test_join_split_roundtrip() {
        let data = Bytes::from((0..=255u8).cycle().take(10_000).collect::<Vec<_>>());
        for size in [1u64, 7, 256, 4096, 10_000, 20_000] {
            let chunks = split(&data, size).unwrap();
            assert!(chunks.iter().all(|c| !c.is_empty()));
            assert_eq!(join(&chunks), data, "roundtrip failed for chunk size {size}");
        }
    }

    #[test]
    fn test_join_empty() {
        assert_eq!(join(&[]), Bytes::new());
    }
}
