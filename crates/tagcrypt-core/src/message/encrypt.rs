//! Message encryption, the sending half of [`super::MessageDecryptEngine`].

use ciborium::Value;
use tagcrypt_crypto::{CipherDescriptor, CipherKind, CipherSession, Direction};

use crate::{
    env::Environment,
    error::EngineError,
    pdu::{META_FINAL, META_IV, Message},
};

/// Encrypts messages into IV-tagged segments.
///
/// The first message of each segment gets a freshly drawn `iv`. A message
/// whose metadata contains `final` closes the segment: the session is
/// finalized (padding applied if enabled) and `final` stays in the output so
/// the receiver closes at the same boundary.
pub struct MessageEncryptEngine<E: Environment> {
    session: CipherSession,
    env: E,
    segment_open: bool,
}

impl<E: Environment> MessageEncryptEngine<E> {
    /// Create an engine. No IV is drawn until the first message.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for AEAD descriptors
    /// - `InvalidKey` on key length mismatch
    pub fn new(descriptor: &CipherDescriptor, key: &[u8], env: E) -> Result<Self, EngineError> {
        let session = CipherSession::new(descriptor, key, Direction::Encrypt)?;
        Ok(Self { session, env, segment_open: false })
    }

    /// Encrypt one message.
    ///
    /// # Errors
    ///
    /// - `EmptyPayload` if the payload holds no bytes
    /// - `UnalignedChunk` for a non-final block cipher payload that is not
    ///   block-aligned
    /// - `Entropy` if a segment IV cannot be drawn
    pub fn handle(&mut self, message: Message) -> Result<Message, EngineError> {
        if message.payload.is_empty() {
            return Err(EngineError::EmptyPayload);
        }

        let Message { mut metadata, payload } = message;
        let closes = metadata.contains_key(META_FINAL);

        let descriptor = self.session.descriptor();
        if descriptor.kind() == CipherKind::Block
            && !closes
            && payload.len() % descriptor.block_size() != 0
        {
            return Err(EngineError::UnalignedChunk {
                len: payload.len(),
                block_size: descriptor.block_size(),
            });
        }

        // IV-less ciphers announce an empty IV so segment boundaries look the
        // same on the wire for every cipher
        if !self.segment_open {
            let iv = self.env.random_vec(self.session.descriptor().iv_len())?;
            self.session.rotate_iv(&iv)?;
            metadata.insert(META_IV.to_string(), Value::Bytes(iv));
            self.segment_open = true;
            tracing::debug!("message segment opened");
        } else {
            // A stale iv from the caller would make the receiver rekey mid-segment
            metadata.remove(META_IV);
        }

        let mut ciphertext = self.session.update(&payload)?;
        if closes {
            self.segment_open = false;
            ciphertext.extend(self.session.finalize()?);
            tracing::debug!("message segment closed");
        }

        Ok(Message::new(metadata, ciphertext))
    }

    /// Encode the encrypted message as CBOR bytes.
    pub fn handle_bytes(&mut self, bytes: &[u8]) -> Result<Vec<u8>, EngineError> {
        self.handle(Message::decode(bytes)?)?.encode()
    }

    /// Whether the next message continues an open segment.
    pub fn segment_open(&self) -> bool {
        self.segment_open
    }
}
