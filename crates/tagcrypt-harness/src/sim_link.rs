//! Lossless link that re-cuts a tagged stream into random windows.
//!
//! The link preserves every byte and every annotation offset but not chunk
//! boundaries: what the sender wrote as one chunk may arrive split across
//! several windows, or merged with its neighbours.
//!
//! ```text
//! sent:      |--- chunk 0 ---|-- chunk 1 --|---- chunk 2 ----|
//! received:  |-w0-|---- w1 ----|-w2-|-------- w3 ---------|
//! ```
//!
//! An annotation is delivered with the window containing its offset. One that
//! sits exactly at the end of the queued bytes waits for the next window, or
//! for [`SimLink::drain`] at the end of the stream.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tagcrypt_core::{StreamAnnotation, StreamChunk};

/// Simulated resegmenting transport.
#[derive(Debug)]
pub struct SimLink {
    rng: ChaCha8Rng,
    max_window: usize,
    data: Vec<u8>,
    annotations: Vec<StreamAnnotation>,
    /// Stream offset of `data[0]`
    offset: u64,
}

impl SimLink {
    /// Create a link delivering windows of `1..=max_window` bytes.
    pub fn new(seed: u64, max_window: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_window: max_window.max(1),
            data: Vec::new(),
            annotations: Vec::new(),
            offset: 0,
        }
    }

    /// Queue a chunk produced by a sender.
    pub fn send(&mut self, chunk: &StreamChunk) {
        self.data.extend_from_slice(&chunk.data);
        self.annotations.extend(chunk.annotations.iter().cloned());
        self.annotations.sort_by_key(|a| a.offset);
    }

    /// Deliver the next window, if any bytes are queued.
    pub fn recv(&mut self) -> Option<StreamChunk> {
        if self.data.is_empty() {
            return None;
        }

        let len = self.rng.gen_range(1..=self.max_window).min(self.data.len());
        let end = self.offset + len as u64;
        let data: Vec<u8> = self.data.drain(..len).collect();

        let split = self.annotations.partition_point(|a| a.offset < end);
        let annotations: Vec<StreamAnnotation> = self.annotations.drain(..split).collect();

        tracing::trace!(
            start = self.offset,
            len,
            annotations = annotations.len(),
            "window delivered"
        );
        self.offset = end;

        Some(StreamChunk { data, annotations })
    }

    /// Deliver everything still queued, including trailing annotations.
    pub fn drain(&mut self) -> Vec<StreamChunk> {
        let mut windows = Vec::new();
        while let Some(window) = self.recv() {
            windows.push(window);
        }
        if !self.annotations.is_empty() {
            let annotations = std::mem::take(&mut self.annotations);
            windows.push(StreamChunk { data: Vec::new(), annotations });
        }
        windows
    }

    /// Stream offset of the next byte to be delivered.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes queued and not yet delivered.
    pub fn pending(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(data: &[u8], annotations: Vec<StreamAnnotation>) -> StreamChunk {
        StreamChunk { data: data.to_vec(), annotations }
    }

    #[test]
    fn preserves_bytes_and_offsets() {
        let mut link = SimLink::new(3, 4);
        let ivs = vec![StreamAnnotation::iv(0, &[1]), StreamAnnotation::iv(6, &[2])];
        link.send(&chunk(b"0123456789", ivs));

        let mut start = 0u64;
        let mut data = Vec::new();
        let mut seen = Vec::new();
        for window in link.drain() {
            for annotation in &window.annotations {
                assert!(annotation.offset >= start);
                assert!(annotation.offset <= start + window.data.len() as u64);
                seen.push(annotation.offset);
            }
            start += window.data.len() as u64;
            data.extend(window.data);
        }

        assert_eq!(data, b"0123456789");
        assert_eq!(seen, vec![0, 6]);
        assert_eq!(link.pending(), 0);
    }

    #[test]
    fn trailing_annotation_delivered_on_drain() {
        let mut link = SimLink::new(1, 16);
        link.send(&chunk(b"abc", vec![StreamAnnotation::iv(3, &[9])]));

        let windows = link.drain();
        let last = windows.last().unwrap();
        assert!(last.data.is_empty());
        assert_eq!(last.annotations[0].offset, 3);
    }

    #[test]
    fn windows_never_exceed_max() {
        let mut link = SimLink::new(11, 5);
        link.send(&chunk(&[0u8; 64], Vec::new()));

        while let Some(window) = link.recv() {
            assert!((1..=5).contains(&window.data.len()));
        }
        assert_eq!(link.offset(), 64);
    }
}
