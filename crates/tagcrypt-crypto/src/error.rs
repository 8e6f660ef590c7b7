//! Error types for cipher descriptors and sessions.

use thiserror::Error;

/// Errors raised by the cipher layer.
///
/// None of these are transient: a cipher that rejects a key, an IV or a
/// ciphertext will reject it again on retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Algorithm name not present in the catalog
    #[error("unknown cipher: {name}")]
    UnknownCipher {
        /// Name as supplied by the caller
        name: String,
    },

    /// Descriptor and engine cannot be combined
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with the combination
        reason: String,
    },

    /// Underlying primitive rejected the key/IV pair
    #[error("cipher initialization failed for {cipher}")]
    CipherInit {
        /// Catalog name of the cipher
        cipher: &'static str,
    },

    /// Key length does not match the cipher
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKey {
        /// Length required by the cipher
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// IV length does not match the cipher
    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIv {
        /// Length required by the cipher
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// Transform requested before an IV was bound (or after finalize)
    #[error("cipher operation without IV")]
    MissingIv,

    /// Finalize without padding found a partial block in the buffer
    #[error("incomplete block at finalize: {buffered} of {block_size} bytes buffered")]
    IncompleteBlock {
        /// Bytes left in the buffer
        buffered: usize,
        /// Cipher block size
        block_size: usize,
    },

    /// PKCS#7 padding did not verify on decrypt
    #[error("bad padding in final block")]
    BadPadding,

    /// AEAD tag did not verify
    #[error("authentication failed")]
    AuthenticationFailed,
}

impl CipherError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Cipher errors are never transient.
    pub fn is_transient(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_errors_are_fatal() {
        assert!(!CipherError::MissingIv.is_transient());
        assert!(!CipherError::BadPadding.is_transient());
        assert!(!CipherError::AuthenticationFailed.is_transient());
        assert!(!CipherError::UnknownCipher { name: "rot13".to_string() }.is_transient());
    }

    #[test]
    fn messages_carry_lengths() {
        let err = CipherError::InvalidIv { expected: 16, actual: 12 };
        assert_eq!(err.to_string(), "invalid IV length: expected 16, got 12");

        let err = CipherError::IncompleteBlock { buffered: 3, block_size: 16 };
        assert!(err.to_string().contains("3 of 16"));
    }
}
