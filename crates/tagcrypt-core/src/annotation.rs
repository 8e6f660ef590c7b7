//! Position-keyed annotations on a tagged byte stream.

use crate::pdu::META_IV;

/// Out-of-band marker attached to an absolute stream offset.
///
/// An annotation under [`META_IV`] means "from this offset forward, the cipher
/// uses this IV". On the encrypt side an `iv` annotation in the pending set
/// is a rotation request and its value is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamAnnotation {
    /// Absolute stream position (bytes since the start of the stream)
    pub offset: u64,
    /// Annotation key
    pub key: String,
    /// Raw value bytes
    pub value: Vec<u8>,
}

impl StreamAnnotation {
    /// Create an annotation.
    pub fn new(offset: u64, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self { offset, key: key.into(), value: value.into() }
    }

    /// IV announcement.
    pub fn iv(offset: u64, iv: &[u8]) -> Self {
        Self::new(offset, META_IV, iv)
    }

    /// Rotation request for the encrypt side.
    pub fn rotate_request(offset: u64) -> Self {
        Self::new(offset, META_IV, Vec::new())
    }

    /// Packet-length marker, length encoded as u64 big-endian.
    pub fn packet_len(offset: u64, key: impl Into<String>, len: u64) -> Self {
        Self::new(offset, key, len.to_be_bytes())
    }

    /// Whether this is an IV annotation.
    pub fn is_iv(&self) -> bool {
        self.key == META_IV
    }

    /// Decode the value as a packet length.
    pub fn packet_len_value(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.value.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }
}

/// Output of one stream invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamChunk {
    /// Transformed bytes
    pub data: Vec<u8>,
    /// Annotations to attach downstream, in offset order
    pub annotations: Vec<StreamAnnotation>,
}

impl StreamChunk {
    /// IV annotations in this chunk.
    pub fn iv_annotations(&self) -> impl Iterator<Item = &StreamAnnotation> {
        self.annotations.iter().filter(|a| a.is_iv())
    }
}
