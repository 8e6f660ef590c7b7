//! Error types for the tagcrypt engines.
//!
//! Engine errors wrap [`CipherError`] for everything the cipher layer
//! rejects and add the transport-shape errors (malformed PDUs, empty
//! payloads, misaligned chunks) that only make sense at the engine boundary.

use tagcrypt_crypto::CipherError;
use thiserror::Error;

use crate::env::EntropyError;

/// Errors returned from a stream or message invocation.
///
/// All variants are terminal for the invocation that produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Rejected by the cipher layer (unknown cipher, bad key/IV, missing IV,
    /// padding or authentication failure)
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// Input is not a `[metadata, payload]` PDU
    #[error("malformed message: {reason}")]
    MalformedMessage {
        /// What was wrong with the PDU
        reason: String,
    },

    /// Payload field is present but holds no bytes
    #[error("message payload is empty")]
    EmptyPayload,

    /// Block cipher chunk that would need cross-call buffering
    #[error("chunk of {len} bytes is not a multiple of block size {block_size}")]
    UnalignedChunk {
        /// Length of the rejected chunk
        len: usize,
        /// Cipher block size
        block_size: usize,
    },

    /// IV annotation that does not fall inside the current window
    #[error("annotation at offset {offset} outside window {start}..={end}")]
    AnnotationOutOfWindow {
        /// Offset carried by the annotation
        offset: u64,
        /// First stream position of the window
        start: u64,
        /// One past the last stream position of the window
        end: u64,
    },

    /// Random source failed while drawing an IV or nonce
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

impl EngineError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Only entropy exhaustion qualifies. Cipher and protocol errors are
    /// deterministic and will fail again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Entropy(_))
    }

    /// Payload arrived while no IV was bound.
    pub fn is_missing_iv(&self) -> bool {
        matches!(self, Self::Cipher(CipherError::MissingIv))
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage { reason: reason.into() }
    }
}
