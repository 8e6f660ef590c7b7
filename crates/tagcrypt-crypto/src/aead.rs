//! Authenticated encryption with detached tags.
//!
//! Tags travel beside the ciphertext (in message metadata), so sealing returns
//! them separately instead of appending them to the ciphertext.
//!
//! Tag verification fails closed: a bad tag, nonce or ciphertext yields
//! `AuthenticationFailed` and no plaintext.

use aes_gcm::{
    Aes128Gcm, Aes256Gcm,
    aead::{AeadInPlace, KeyInit, generic_array::GenericArray},
};
use chacha20poly1305::ChaCha20Poly1305;

use crate::{
    catalog::{AEAD_TAG_LEN, Algorithm, CipherDescriptor},
    error::CipherError,
};

enum Inner {
    Aes128Gcm(Box<Aes128Gcm>),
    Aes256Gcm(Box<Aes256Gcm>),
    ChaCha20Poly1305(Box<ChaCha20Poly1305>),
}

/// Keyed AEAD instance.
pub struct AeadCipher {
    inner: Inner,
    descriptor: CipherDescriptor,
}

impl AeadCipher {
    /// Key an AEAD from its descriptor.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if the descriptor is not an AEAD
    /// - `InvalidKey` if the key length does not match
    pub fn new(descriptor: &CipherDescriptor, key: &[u8]) -> Result<Self, CipherError> {
        let invalid_key =
            || CipherError::InvalidKey { expected: descriptor.key_len(), actual: key.len() };

        let inner = match descriptor.algorithm() {
            Algorithm::Aes128Gcm => {
                let cipher = Aes128Gcm::new_from_slice(key).map_err(|_| invalid_key())?;
                Inner::Aes128Gcm(Box::new(cipher))
            },
            Algorithm::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| invalid_key())?;
                Inner::Aes256Gcm(Box::new(cipher))
            },
            Algorithm::ChaCha20Poly1305 => Inner::ChaCha20Poly1305(Box::new(
                ChaCha20Poly1305::new_from_slice(key).map_err(|_| invalid_key())?,
            )),
            _ => {
                return Err(CipherError::InvalidConfiguration {
                    reason: format!("{} is not an AEAD", descriptor.name()),
                });
            },
        };

        Ok(Self { inner, descriptor: descriptor.clone() })
    }

    /// Descriptor this cipher was keyed from.
    pub fn descriptor(&self) -> &CipherDescriptor {
        &self.descriptor
    }

    /// Encrypt and authenticate `plaintext`, binding `aad`.
    ///
    /// Returns `(ciphertext, tag)`; the ciphertext has the plaintext's length.
    ///
    /// # Security
    ///
    /// The caller MUST never reuse a nonce under the same key.
    pub fn seal(
        &self,
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, [u8; AEAD_TAG_LEN]), CipherError> {
        self.check_nonce(nonce)?;
        let nonce = GenericArray::from_slice(nonce);
        let mut buffer = plaintext.to_vec();

        let tag = match &self.inner {
            Inner::Aes128Gcm(c) => c.encrypt_in_place_detached(nonce, aad, &mut buffer),
            Inner::Aes256Gcm(c) => c.encrypt_in_place_detached(nonce, aad, &mut buffer),
            Inner::ChaCha20Poly1305(c) => c.encrypt_in_place_detached(nonce, aad, &mut buffer),
        }
        .map_err(|_| CipherError::CipherInit { cipher: self.descriptor.name() })?;

        let mut out = [0u8; AEAD_TAG_LEN];
        out.copy_from_slice(&tag);
        Ok((buffer, out))
    }

    /// Verify and decrypt.
    ///
    /// # Errors
    ///
    /// - `InvalidIv` if the nonce has the wrong length
    /// - `AuthenticationFailed` on any tag mismatch or malformed tag
    pub fn open(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        self.check_nonce(nonce)?;
        if tag.len() != AEAD_TAG_LEN {
            return Err(CipherError::AuthenticationFailed);
        }

        let nonce = GenericArray::from_slice(nonce);
        let tag = GenericArray::from_slice(tag);
        let mut buffer = ciphertext.to_vec();

        match &self.inner {
            Inner::Aes128Gcm(c) => c.decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
            Inner::Aes256Gcm(c) => c.decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
            Inner::ChaCha20Poly1305(c) => c.decrypt_in_place_detached(nonce, aad, &mut buffer, tag),
        }
        .map_err(|_| CipherError::AuthenticationFailed)?;

        Ok(buffer)
    }

    fn check_nonce(&self, nonce: &[u8]) -> Result<(), CipherError> {
        if nonce.len() == self.descriptor.iv_len() {
            Ok(())
        } else {
            Err(CipherError::InvalidIv { expected: self.descriptor.iv_len(), actual: nonce.len() })
        }
    }
}
