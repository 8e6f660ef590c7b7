//! AEAD verification.

use tagcrypt_crypto::{AeadCipher, CipherDescriptor, CipherError};

use super::associated_data;
use crate::{
    error::EngineError,
    pdu::{META_IV, META_TAG, Message},
};

/// Opens messages produced by [`super::AuthEncryptEngine`].
///
/// Fails closed: a message that does not verify never yields plaintext.
pub struct AuthDecryptEngine {
    cipher: AeadCipher,
}

impl AuthDecryptEngine {
    /// Create an engine from an AEAD descriptor.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for non-AEAD descriptors
    /// - `InvalidKey` on key length mismatch
    pub fn new(descriptor: &CipherDescriptor, key: &[u8]) -> Result<Self, EngineError> {
        Ok(Self { cipher: AeadCipher::new(descriptor, key)? })
    }

    /// Verify and decrypt one message, stripping `iv` and `tag`.
    ///
    /// # Errors
    ///
    /// - `MissingIv` if the message has no `iv` byte string
    /// - `MalformedMessage` if the message has no `tag` byte string
    /// - `InvalidIv` if the nonce has the wrong length
    /// - `AuthenticationFailed` if verification fails
    pub fn handle(&mut self, message: Message) -> Result<Message, EngineError> {
        let nonce = message.bytes(META_IV).ok_or(CipherError::MissingIv)?;
        let tag = message
            .bytes(META_TAG)
            .ok_or_else(|| EngineError::malformed("authenticated message without tag"))?;
        let aad = associated_data(&message);

        let plaintext = match self.cipher.open(nonce, &aad, &message.payload, tag) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::warn!(error = %e, "rejected authenticated message");
                return Err(e.into());
            },
        };

        let mut metadata = message.metadata;
        metadata.remove(META_IV);
        metadata.remove(META_TAG);
        Ok(Message::new(metadata, plaintext))
    }

    /// Decode CBOR bytes and open them.
    pub fn handle_bytes(&mut self, bytes: &[u8]) -> Result<Message, EngineError> {
        self.handle(Message::decode(bytes)?)
    }
}
