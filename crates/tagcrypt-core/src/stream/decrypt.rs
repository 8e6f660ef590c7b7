//! Stream decryption driven by IV annotations.

use tagcrypt_crypto::{CipherDescriptor, CipherError, CipherSession, Direction};

use super::check_window;
use crate::{
    annotation::{StreamAnnotation, StreamChunk},
    config::StreamConfig,
    error::EngineError,
};

/// Decrypts a tagged stream produced by a
/// [`StreamEncryptEngine`](super::StreamEncryptEngine).
///
/// The window is split at every `iv` annotation; bytes before the split run
/// under the old IV, bytes after it under the new one. Windows may be cut
/// anywhere: partial CBC blocks are carried to the next call, so per-call
/// output length can differ from input length for block ciphers while the
/// stream as a whole stays length-preserving.
pub struct StreamDecryptEngine {
    session: CipherSession,
    config: StreamConfig,
    position: u64,
}

impl StreamDecryptEngine {
    /// Create an engine. Bytes are rejected with `MissingIv` until the first
    /// `iv` annotation arrives, except for IV-less ciphers.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if padding is enabled or the cipher is an AEAD
    /// - `InvalidKey` on key length mismatch
    pub fn new(descriptor: &CipherDescriptor, key: &[u8]) -> Result<Self, EngineError> {
        Self::with_config(descriptor, key, StreamConfig::default())
    }

    /// Create an engine that forwards packet-length annotations.
    pub fn with_config(
        descriptor: &CipherDescriptor,
        key: &[u8],
        config: StreamConfig,
    ) -> Result<Self, EngineError> {
        if descriptor.pads() {
            return Err(CipherError::InvalidConfiguration {
                reason: format!("{} with padding cannot decrypt a stream", descriptor.name()),
            }
            .into());
        }

        let session = CipherSession::new(descriptor, key, Direction::Decrypt)?;
        Ok(Self { session, config, position: 0 })
    }

    /// Decrypt one window.
    ///
    /// # Errors
    ///
    /// - `AnnotationOutOfWindow` if an annotation lies outside the window
    /// - `InvalidIv` if an `iv` annotation has the wrong length
    /// - `MissingIv` if bytes arrive before any IV
    pub fn process(
        &mut self,
        input: &[u8],
        annotations: &[StreamAnnotation],
    ) -> Result<StreamChunk, EngineError> {
        let start = self.position;
        let end = start + input.len() as u64;
        for annotation in annotations {
            check_window(annotation, start, end)?;
        }

        let mut rotations: Vec<&StreamAnnotation> =
            annotations.iter().filter(|a| a.is_iv()).collect();
        rotations.sort_by_key(|a| a.offset);

        let iv_len = self.session.descriptor().iv_len();
        if let Some(bad) = rotations.iter().find(|a| a.value.len() != iv_len) {
            return Err(
                CipherError::InvalidIv { expected: iv_len, actual: bad.value.len() }.into()
            );
        }
        let first_cut = rotations.first().map_or(end, |a| a.offset);
        if !self.session.has_valid_iv() && first_cut > start {
            return Err(CipherError::MissingIv.into());
        }

        let mut data = Vec::with_capacity(input.len());
        let mut cursor = 0usize;
        for rotation in rotations {
            let cut = (rotation.offset - start) as usize;
            if cut > cursor {
                data.extend(self.session.update(&input[cursor..cut])?);
                cursor = cut;
            }
            self.session.rotate_iv(&rotation.value)?;
            tracing::debug!(offset = rotation.offset, "stream IV synchronized");
        }
        if cursor < input.len() {
            data.extend(self.session.update(&input[cursor..])?);
        }
        self.position = end;

        let forwarded = match &self.config.packet_len_key {
            Some(key) => annotations.iter().filter(|a| a.key == *key).cloned().collect(),
            None => Vec::new(),
        };

        Ok(StreamChunk { data, annotations: forwarded })
    }

    /// Stream offset of the next input byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether an IV has been received (always true for IV-less ciphers).
    pub fn has_valid_iv(&self) -> bool {
        self.session.has_valid_iv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::CountingEnv, stream::StreamEncryptEngine};

    fn descriptor(name: &str) -> CipherDescriptor {
        CipherDescriptor::lookup(name, false).unwrap()
    }

    #[test]
    fn bytes_before_iv_rejected() {
        let mut dec = StreamDecryptEngine::new(&descriptor("aes-128-ctr"), &[0u8; 16]).unwrap();

        let err = dec.process(&[1, 2, 3], &[]).unwrap_err();
        assert!(err.is_missing_iv());
    }

    #[test]
    fn rotation_mid_window_splits_input() {
        let desc = descriptor("aes-128-ctr");
        let key = [7u8; 16];
        let mut enc = StreamEncryptEngine::new(&desc, &key, CountingEnv::default()).unwrap();

        let first = enc.process(b"first part", &[]).unwrap();
        let second = enc.process(b"second", &[StreamAnnotation::rotate_request(10)]).unwrap();

        // Deliver both encrypted chunks as a single window
        let mut ciphertext = first.data.clone();
        ciphertext.extend(&second.data);
        let mut annotations = first.annotations.clone();
        annotations.extend(second.annotations.clone());

        let mut dec = StreamDecryptEngine::new(&desc, &key).unwrap();
        let out = dec.process(&ciphertext, &annotations).unwrap();
        assert_eq!(out.data, b"first partsecond");
        assert_eq!(dec.position(), 16);
    }

    #[test]
    fn annotation_at_window_end_applies_to_next_window() {
        let desc = descriptor("chacha20");
        let key = [1u8; 32];
        let mut enc = StreamEncryptEngine::new(&desc, &key, CountingEnv::default()).unwrap();
        let a = enc.process(b"abc", &[]).unwrap();
        let b = enc.process(b"def", &[StreamAnnotation::rotate_request(3)]).unwrap();

        let mut dec = StreamDecryptEngine::new(&desc, &key).unwrap();
        let mut early = a.annotations.clone();
        early.extend(b.annotations.clone());
        assert_eq!(dec.process(&a.data, &early).unwrap().data, b"abc");
        assert_eq!(dec.process(&b.data, &[]).unwrap().data, b"def");
    }

    #[test]
    fn wrong_length_iv_rejected() {
        let mut dec = StreamDecryptEngine::new(&descriptor("aes-128-ctr"), &[0u8; 16]).unwrap();

        let result = dec.process(&[0u8; 4], &[StreamAnnotation::iv(0, &[0u8; 8])]);
        assert_eq!(
            result,
            Err(EngineError::Cipher(CipherError::InvalidIv { expected: 16, actual: 8 }))
        );
    }

    #[test]
    fn rejected_window_decrypts_nothing() {
        let mut dec = StreamDecryptEngine::new(&descriptor("aes-128-ctr"), &[0u8; 16]).unwrap();
        let annotations = [StreamAnnotation::iv(0, &[0u8; 16]), StreamAnnotation::iv(2, &[0u8; 3])];

        assert!(dec.process(&[0u8; 4], &annotations).is_err());
        assert!(!dec.has_valid_iv());
        assert_eq!(dec.position(), 0);
    }

    #[test]
    fn out_of_window_rejected() {
        let mut dec = StreamDecryptEngine::new(&descriptor("aes-128-ctr"), &[0u8; 16]).unwrap();

        let result = dec.process(&[0u8; 4], &[StreamAnnotation::iv(9, &[0u8; 16])]);
        assert_eq!(result, Err(EngineError::AnnotationOutOfWindow { offset: 9, start: 0, end: 4 }));
    }

    #[test]
    fn ivless_cipher_needs_no_announcement() {
        let mut dec = StreamDecryptEngine::new(&descriptor("aes-128-ecb"), &[0u8; 16]).unwrap();

        assert!(dec.has_valid_iv());
        assert_eq!(dec.process(&[0u8; 16], &[]).unwrap().data.len(), 16);
    }
}
