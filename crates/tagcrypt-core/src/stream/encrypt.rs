//! Unpadded stream encryption with IV announcements.

use tagcrypt_crypto::{CipherDescriptor, CipherError, CipherKind, CipherSession, Direction};

use super::check_window;
use crate::{
    annotation::{StreamAnnotation, StreamChunk},
    config::StreamConfig,
    env::Environment,
    error::EngineError,
};

/// Encrypts a continuous byte stream chunk by chunk.
///
/// Every IV the engine starts using is announced as an `iv` annotation at the
/// stream offset where it takes effect. The first chunk always carries one at
/// offset 0 so a receiver can join at the start of the stream.
///
/// # Invariants
///
/// - Output length equals input length for every call
/// - `position()` equals the total number of bytes consumed
/// - Block ciphers only accept block-aligned chunks, so nothing is ever held
///   back between calls
pub struct StreamEncryptEngine<E: Environment> {
    session: CipherSession,
    config: StreamConfig,
    env: E,
    position: u64,
    announced: bool,
}

impl<E: Environment> StreamEncryptEngine<E> {
    /// Create an engine and draw the initial IV.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if padding is enabled or the cipher is an AEAD
    /// - `InvalidKey` on key length mismatch
    /// - `Entropy` if the initial IV cannot be drawn
    pub fn new(descriptor: &CipherDescriptor, key: &[u8], env: E) -> Result<Self, EngineError> {
        Self::with_config(descriptor, key, StreamConfig::default(), env)
    }

    /// Create an engine that forwards packet-length annotations.
    pub fn with_config(
        descriptor: &CipherDescriptor,
        key: &[u8],
        config: StreamConfig,
        env: E,
    ) -> Result<Self, EngineError> {
        if descriptor.pads() {
            return Err(CipherError::InvalidConfiguration {
                reason: format!("{} with padding cannot encrypt a stream", descriptor.name()),
            }
            .into());
        }

        let session = CipherSession::new(descriptor, key, Direction::Encrypt)?;
        let mut engine = Self { session, config, env, position: 0, announced: false };
        engine.draw_iv()?;

        tracing::debug!(cipher = descriptor.name(), "stream encryptor ready");
        Ok(engine)
    }

    /// Encrypt one chunk.
    ///
    /// `pending` holds the annotations the host attached to this chunk's
    /// window. An `iv` entry among them requests a fresh IV starting at the
    /// beginning of the chunk; packet-length entries are forwarded unchanged.
    ///
    /// # Errors
    ///
    /// - `UnalignedChunk` for a block cipher chunk that is not block-aligned
    /// - `AnnotationOutOfWindow` if a pending annotation lies outside the chunk
    /// - `Entropy` if a requested rotation cannot draw an IV
    ///
    /// On error the engine state is unchanged.
    pub fn process(
        &mut self,
        input: &[u8],
        pending: &[StreamAnnotation],
    ) -> Result<StreamChunk, EngineError> {
        let descriptor = self.session.descriptor();
        if descriptor.kind() == CipherKind::Block && input.len() % descriptor.block_size() != 0 {
            return Err(EngineError::UnalignedChunk {
                len: input.len(),
                block_size: descriptor.block_size(),
            });
        }

        let start = self.position;
        let end = start + input.len() as u64;
        for annotation in pending {
            check_window(annotation, start, end)?;
        }

        let mut annotations = Vec::new();
        if pending.iter().any(StreamAnnotation::is_iv) {
            self.draw_iv()?;
            tracing::debug!(offset = start, "rotated stream IV");
            annotations.push(StreamAnnotation::iv(start, self.session.iv()));
        } else if !self.announced {
            annotations.push(StreamAnnotation::iv(start, self.session.iv()));
        }
        self.announced = true;

        if let Some(key) = &self.config.packet_len_key {
            annotations.extend(pending.iter().filter(|a| a.key == *key).cloned());
        }
        annotations.sort_by_key(|a| a.offset);

        let data = self.session.update(input)?;
        self.position = end;

        Ok(StreamChunk { data, annotations })
    }

    /// Stream offset of the next input byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// IV currently in use.
    pub fn iv(&self) -> &[u8] {
        self.session.iv()
    }

    /// Descriptor this engine encrypts with.
    pub fn descriptor(&self) -> &CipherDescriptor {
        self.session.descriptor()
    }

    fn draw_iv(&mut self) -> Result<(), EngineError> {
        let iv = self.env.random_vec(self.session.descriptor().iv_len())?;
        self.session.rotate_iv(&iv)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{CountingEnv, FailingEnv};

    fn engine(name: &str) -> StreamEncryptEngine<CountingEnv> {
        let desc = CipherDescriptor::lookup(name, false).unwrap();
        StreamEncryptEngine::new(&desc, &vec![0u8; desc.key_len()], CountingEnv::default()).unwrap()
    }

    #[test]
    fn first_chunk_announces_iv_at_zero() {
        let mut enc = engine("aes-128-ctr");

        let chunk = enc.process(b"hello", &[]).unwrap();
        assert_eq!(chunk.annotations, vec![StreamAnnotation::iv(0, &[1u8; 16])]);
        assert_eq!(chunk.data.len(), 5);

        let chunk = enc.process(b"world", &[]).unwrap();
        assert!(chunk.annotations.is_empty());
        assert_eq!(enc.position(), 10);
    }

    #[test]
    fn rotation_request_announces_new_iv_at_chunk_start() {
        let mut enc = engine("chacha20");
        enc.process(&[0u8; 7], &[]).unwrap();

        let chunk = enc.process(&[0u8; 9], &[StreamAnnotation::rotate_request(10)]).unwrap();
        assert_eq!(chunk.annotations, vec![StreamAnnotation::iv(7, &[2u8; 12])]);
        assert_eq!(enc.iv(), &[2u8; 12]);
    }

    #[test]
    fn rotation_on_first_chunk_is_not_duplicated() {
        let mut enc = engine("aes-128-ctr");

        let chunk = enc.process(&[0u8; 4], &[StreamAnnotation::rotate_request(0)]).unwrap();
        assert_eq!(chunk.iv_annotations().count(), 1);
        assert_eq!(chunk.annotations[0].value, vec![2u8; 16]);
    }

    #[test]
    fn block_cipher_rejects_unaligned_chunk() {
        let mut enc = engine("aes-128-cbc");

        assert_eq!(
            enc.process(&[0u8; 20], &[]),
            Err(EngineError::UnalignedChunk { len: 20, block_size: 16 })
        );
        assert_eq!(enc.position(), 0);
        assert_eq!(enc.process(&[0u8; 32], &[]).unwrap().data.len(), 32);
    }

    #[test]
    fn padding_and_aead_rejected() {
        let padded = CipherDescriptor::lookup("aes-128-cbc", true).unwrap();
        assert!(matches!(
            StreamEncryptEngine::new(&padded, &[0u8; 16], CountingEnv::default()),
            Err(EngineError::Cipher(CipherError::InvalidConfiguration { .. }))
        ));

        let aead = CipherDescriptor::lookup("aes-128-gcm", false).unwrap();
        assert!(matches!(
            StreamEncryptEngine::new(&aead, &[0u8; 16], CountingEnv::default()),
            Err(EngineError::Cipher(CipherError::InvalidConfiguration { .. }))
        ));
    }

    #[test]
    fn out_of_window_annotation_rejected() {
        let mut enc = engine("aes-128-ctr");

        let result = enc.process(&[0u8; 4], &[StreamAnnotation::rotate_request(5)]);
        assert_eq!(result, Err(EngineError::AnnotationOutOfWindow { offset: 5, start: 0, end: 4 }));
    }

    #[test]
    fn packet_len_annotations_forwarded_when_configured() {
        let desc = CipherDescriptor::lookup("aes-256-ctr", false).unwrap();
        let config = StreamConfig::with_packet_len_key("packet_len");
        let env = CountingEnv::default();
        let mut enc = StreamEncryptEngine::with_config(&desc, &[0u8; 32], config, env).unwrap();

        let pending = [
            StreamAnnotation::packet_len(3, "packet_len", 5),
            StreamAnnotation::new(1, "other", vec![1]),
        ];
        let chunk = enc.process(&[0u8; 8], &pending).unwrap();

        assert_eq!(chunk.annotations.len(), 2);
        assert!(chunk.annotations[0].is_iv());
        assert_eq!(chunk.annotations[1], pending[0]);
    }

    #[test]
    fn entropy_failure_surfaces() {
        let desc = CipherDescriptor::lookup("aes-128-ctr", false).unwrap();
        let result = StreamEncryptEngine::new(&desc, &[0u8; 16], FailingEnv);

        assert!(matches!(result, Err(ref e) if e.is_transient()));
    }
}
