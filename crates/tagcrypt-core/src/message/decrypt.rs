//! Message decryption with in-band IV updates and explicit finalization.

use ciborium::Value;
use tagcrypt_crypto::{CipherDescriptor, CipherSession, Direction};

use crate::{
    error::EngineError,
    pdu::{META_FINAL, META_IV, Message, Metadata},
};

/// Decrypts messages whose metadata may carry `iv` and `final`.
///
/// # State
///
/// ```text
///             iv
/// ┌─────────┐ ──> ┌──────┐ ──┐ payload
/// │ NeedsIv │     │ Open │ <─┘
/// └─────────┘ <── └──────┘ ──┐ iv (flush + rotate)
///             final  ^───────┘
/// ```
///
/// Both protocol keys are stripped from forwarded metadata; every other key
/// passes through unchanged.
pub struct MessageDecryptEngine {
    session: CipherSession,
}

impl MessageDecryptEngine {
    /// Create an engine waiting for its first IV.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for AEAD descriptors
    /// - `InvalidKey` on key length mismatch
    pub fn new(descriptor: &CipherDescriptor, key: &[u8]) -> Result<Self, EngineError> {
        let session = CipherSession::new(descriptor, key, Direction::Decrypt)?;
        tracing::debug!(cipher = descriptor.name(), "message decryptor ready");
        Ok(Self { session })
    }

    /// Decrypt one message.
    ///
    /// Returns one message, or two when an IV update closes a segment that
    /// still held output: the flushed bytes come first with empty metadata,
    /// followed by the decrypted input message.
    ///
    /// An IV update always takes effect, even when the rest of the message is
    /// rejected. If the old segment cannot be finalized (a partial block, or
    /// padding that never arrived) its tail is dropped with a warning and the
    /// new segment starts anyway.
    ///
    /// # Errors
    ///
    /// - `EmptyPayload` if the payload holds no bytes
    /// - `MissingIv` if no IV is bound
    /// - `BadPadding` / `IncompleteBlock` when finalizing on `final`
    pub fn handle(&mut self, message: Message) -> Result<Vec<Message>, EngineError> {
        let Message { mut metadata, payload } = message;
        let mut out = Vec::with_capacity(1);

        if let Some(iv) = take_iv(&mut metadata, self.session.descriptor().iv_len()) {
            if self.session.has_valid_iv() {
                match self.session.finalize() {
                    Ok(flushed) if !flushed.is_empty() => {
                        tracing::warn!(
                            bytes = flushed.len(),
                            "IV update flushed an unfinalized segment"
                        );
                        out.push(Message::data(flushed));
                    },
                    Ok(_) => {},
                    Err(error) => {
                        tracing::warn!(
                            %error,
                            "IV update dropped the tail of an unfinished segment"
                        );
                    },
                }
            }
            self.session.rotate_iv(&iv)?;
            tracing::debug!(iv_len = iv.len(), "message IV updated");
        }

        if payload.is_empty() {
            if !out.is_empty() {
                tracing::warn!("flushed segment tail discarded with an empty message");
            }
            return Err(EngineError::EmptyPayload);
        }

        let mut plaintext = self.session.update(&payload)?;
        if metadata.remove(META_FINAL).is_some() {
            plaintext.extend(self.session.finalize()?);
            tracing::debug!("segment finalized");
        }

        out.push(Message::new(metadata, plaintext));
        Ok(out)
    }

    /// Decode a CBOR value and decrypt it.
    pub fn handle_value(&mut self, value: Value) -> Result<Vec<Message>, EngineError> {
        self.handle(Message::from_value(value)?)
    }

    /// Decode CBOR bytes and decrypt them.
    pub fn handle_bytes(&mut self, bytes: &[u8]) -> Result<Vec<Message>, EngineError> {
        self.handle(Message::decode(bytes)?)
    }

    /// Whether a segment is open.
    pub fn has_valid_iv(&self) -> bool {
        self.session.has_valid_iv()
    }
}

/// Remove and return `iv` if it is a byte string of the expected length.
/// Anything else is left in place and forwarded.
fn take_iv(metadata: &mut Metadata, iv_len: usize) -> Option<Vec<u8>> {
    match metadata.get(META_IV) {
        Some(Value::Bytes(iv)) if iv.len() == iv_len => {},
        _ => return None,
    }
    match metadata.remove(META_IV) {
        Some(Value::Bytes(iv)) => Some(iv),
        _ => None,
    }
}
