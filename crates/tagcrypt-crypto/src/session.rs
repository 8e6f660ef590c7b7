//! Cipher session: key, current IV and the engine handle built from them.
//!
//! # State
//!
//! ```text
//!            init / rotate_iv
//! ┌─────────┐ ─────────────> ┌───────┐ ──┐ update
//! │ NeedsIv │                │ Keyed │ <─┘
//! └─────────┘ <───────────── └───────┘
//!               finalize
//! ```
//!
//! IV-less ciphers (`iv_len == 0`) never leave `Keyed`: finalize rebuilds the
//! context with the same key.
//!
//! # Security
//!
//! - Key bytes are zeroized when the session is dropped
//! - `Debug` never prints key material

use std::fmt;

use zeroize::Zeroize;

use crate::{
    catalog::CipherDescriptor,
    context::{CipherContext, Direction},
    error::CipherError,
};

/// Symmetric cipher session owned by a single engine.
///
/// # Invariants
///
/// - `key.len() == descriptor.key_len()` and `iv.len() == descriptor.iv_len()`
/// - No transform runs while the session has no valid IV, unless the cipher is
///   IV-less
pub struct CipherSession {
    descriptor: CipherDescriptor,
    direction: Direction,
    key: Vec<u8>,
    iv: Vec<u8>,
    context: Option<CipherContext>,
}

impl CipherSession {
    /// Create a session bound to `key`.
    ///
    /// IV-less ciphers are ready immediately; others need [`Self::init`] or
    /// [`Self::rotate_iv`] before the first [`Self::update`].
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for AEAD descriptors
    /// - `InvalidKey` if the key length does not match the descriptor
    pub fn new(
        descriptor: &CipherDescriptor,
        key: &[u8],
        direction: Direction,
    ) -> Result<Self, CipherError> {
        if descriptor.is_aead() {
            return Err(CipherError::InvalidConfiguration {
                reason: format!("{} requires an authenticated engine", descriptor.name()),
            });
        }
        check_key(descriptor, key)?;

        let mut session = Self {
            descriptor: descriptor.clone(),
            direction,
            key: key.to_vec(),
            iv: vec![0u8; descriptor.iv_len()],
            context: None,
        };

        if descriptor.iv_len() == 0 {
            session.rebuild()?;
        }

        Ok(session)
    }

    /// Bind a new key and IV and rebuild the context.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` / `InvalidIv` on length mismatch
    /// - `CipherInit` if the primitive rejects the pair
    pub fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
        check_key(&self.descriptor, key)?;
        check_iv(&self.descriptor, iv)?;

        self.key.copy_from_slice(key);
        self.iv.copy_from_slice(iv);
        self.rebuild()
    }

    /// Rebuild the context with the current key and a new IV.
    ///
    /// Any buffered partial block of the previous IV is discarded.
    pub fn rotate_iv(&mut self, iv: &[u8]) -> Result<(), CipherError> {
        check_iv(&self.descriptor, iv)?;

        self.iv.copy_from_slice(iv);
        self.rebuild()
    }

    /// Feed bytes through the transform.
    ///
    /// # Errors
    ///
    /// - `MissingIv` if no IV is bound
    pub fn update(&mut self, input: &[u8]) -> Result<Vec<u8>, CipherError> {
        let context = self.context.as_mut().ok_or(CipherError::MissingIv)?;
        Ok(context.update(input))
    }

    /// Drain buffered state and close the current IV.
    ///
    /// The session needs a new IV afterwards, even when finalize fails. IV-less
    /// ciphers are re-keyed in place.
    pub fn finalize(&mut self) -> Result<Vec<u8>, CipherError> {
        let mut context = self.context.take().ok_or(CipherError::MissingIv)?;
        let result = context.finalize();
        drop(context);

        if self.descriptor.iv_len() == 0 {
            self.rebuild()?;
        }

        result
    }

    /// Whether a transform may run right now.
    pub fn has_valid_iv(&self) -> bool {
        self.context.is_some()
    }

    /// IV currently (or most recently) bound.
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Bytes held in the partial-block buffer.
    pub fn buffered(&self) -> usize {
        self.context.as_ref().map_or(0, CipherContext::buffered)
    }

    /// Descriptor this session was built from.
    pub fn descriptor(&self) -> &CipherDescriptor {
        &self.descriptor
    }

    /// Transform direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn rebuild(&mut self) -> Result<(), CipherError> {
        // Old context goes first so a failed rebuild leaves no usable handle
        self.context = None;
        self.context =
            Some(CipherContext::new(&self.descriptor, self.direction, &self.key, &self.iv)?);
        Ok(())
    }
}

fn check_key(descriptor: &CipherDescriptor, key: &[u8]) -> Result<(), CipherError> {
    if key.len() == descriptor.key_len() {
        Ok(())
    } else {
        Err(CipherError::InvalidKey { expected: descriptor.key_len(), actual: key.len() })
    }
}

fn check_iv(descriptor: &CipherDescriptor, iv: &[u8]) -> Result<(), CipherError> {
    if iv.len() == descriptor.iv_len() {
        Ok(())
    } else {
        Err(CipherError::InvalidIv { expected: descriptor.iv_len(), actual: iv.len() })
    }
}

impl fmt::Debug for CipherSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherSession")
            .field("cipher", &self.descriptor.name())
            .field("direction", &self.direction)
            .field("key", &"<redacted>")
            .field("has_valid_iv", &self.has_valid_iv())
            .finish_non_exhaustive()
    }
}

impl Drop for CipherSession {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}
