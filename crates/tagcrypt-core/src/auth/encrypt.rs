//! AEAD encryption with per-message random nonces.

use ciborium::Value;
use tagcrypt_crypto::{AeadCipher, CipherDescriptor, CipherError};

use super::associated_data;
use crate::{
    env::Environment,
    error::EngineError,
    pdu::{META_IV, META_TAG, Message},
};

/// Random 96-bit nonces stay below the collision bound up to this many
/// messages per key.
const RANDOM_NONCE_LIMIT: u64 = 1 << 32;

/// Seals each message under a fresh nonce.
///
/// # Security
///
/// Nonces are drawn from the [`Environment`] for every message. A warning is
/// logged once the number of messages sealed under one key reaches the
/// random-nonce limit; callers should rekey well before that.
pub struct AuthEncryptEngine<E: Environment> {
    cipher: AeadCipher,
    env: E,
    sealed: u64,
}

impl<E: Environment> AuthEncryptEngine<E> {
    /// Create an engine from an AEAD descriptor.
    ///
    /// `key_len` and `iv_len` are the lengths the caller expects; both must
    /// agree with the descriptor.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for non-AEAD descriptors
    /// - `InvalidKey` if `key_len` or the key disagrees with the descriptor
    /// - `InvalidIv` if `iv_len` disagrees with the descriptor
    pub fn new(
        descriptor: &CipherDescriptor,
        key: &[u8],
        key_len: usize,
        iv_len: usize,
        env: E,
    ) -> Result<Self, EngineError> {
        if !descriptor.is_aead() {
            return Err(CipherError::InvalidConfiguration {
                reason: format!("{} is not an authenticated cipher", descriptor.name()),
            }
            .into());
        }
        if key_len != descriptor.key_len() {
            return Err(
                CipherError::InvalidKey { expected: descriptor.key_len(), actual: key_len }.into()
            );
        }
        if key.len() != key_len {
            return Err(CipherError::InvalidKey { expected: key_len, actual: key.len() }.into());
        }
        if iv_len != descriptor.iv_len() {
            return Err(
                CipherError::InvalidIv { expected: descriptor.iv_len(), actual: iv_len }.into()
            );
        }

        let cipher = AeadCipher::new(descriptor, key)?;
        tracing::debug!(cipher = descriptor.name(), "authenticated encryptor ready");
        Ok(Self { cipher, env, sealed: 0 })
    }

    /// AES-GCM with the key size picked from `key_len` (16 or 32 bytes).
    pub fn aes_gcm(key: &[u8], key_len: usize, iv_len: usize, env: E) -> Result<Self, EngineError> {
        let name = match key_len {
            16 => "aes-128-gcm",
            32 => "aes-256-gcm",
            _ => {
                return Err(CipherError::InvalidConfiguration {
                    reason: format!("AES-GCM key must be 16 or 32 bytes, got {key_len}"),
                }
                .into());
            },
        };
        let descriptor = CipherDescriptor::lookup(name, false)?;
        Self::new(&descriptor, key, key_len, iv_len, env)
    }

    /// Seal one message.
    ///
    /// # Errors
    ///
    /// - `EmptyPayload` if the payload holds no bytes
    /// - `Entropy` if no nonce can be drawn
    pub fn handle(&mut self, message: Message) -> Result<Message, EngineError> {
        if message.payload.is_empty() {
            return Err(EngineError::EmptyPayload);
        }

        let nonce = self.env.random_vec(self.cipher.descriptor().iv_len())?;
        let aad = associated_data(&message);
        let (ciphertext, tag) = self.cipher.seal(&nonce, &aad, &message.payload)?;

        self.sealed += 1;
        if self.sealed == RANDOM_NONCE_LIMIT {
            tracing::warn!(sealed = self.sealed, "random nonce limit reached for this key");
        }

        let mut metadata = message.metadata;
        metadata.insert(META_IV.to_string(), Value::Bytes(nonce));
        metadata.insert(META_TAG.to_string(), Value::Bytes(tag.to_vec()));
        Ok(Message::new(metadata, ciphertext))
    }

    /// Decode CBOR bytes, seal, and encode the result.
    pub fn handle_bytes(&mut self, bytes: &[u8]) -> Result<Vec<u8>, EngineError> {
        self.handle(Message::decode(bytes)?)?.encode()
    }

    /// Messages sealed so far under this key.
    pub fn sealed(&self) -> u64 {
        self.sealed
    }
}
