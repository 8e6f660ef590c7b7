//! Cipher context: the owned engine handle behind a session.
//!
//! Wraps a `RustCrypto` mode instance and the partial-block buffer. Block modes
//! follow OpenSSL's update/final contract:
//!
//! - `update` emits every complete block, buffering the remainder
//! - decrypt with padding holds back the last complete block until `finalize`
//!   so the padding can be stripped
//! - `finalize` drains the buffer and leaves the context unusable until it is
//!   rebuilt
//!
//! Stream modes never buffer.

use aes::{Aes128, Aes192, Aes256};
use chacha20::ChaCha20;
use cipher::{
    BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyInit, KeyIvInit, StreamCipher,
    generic_array::GenericArray,
};
use zeroize::Zeroize;

use crate::{
    catalog::{Algorithm, CipherDescriptor},
    error::CipherError,
};

/// Transform direction of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Plaintext in, ciphertext out
    Encrypt,
    /// Ciphertext in, plaintext out
    Decrypt,
}

trait BlockCore: Send {
    fn process_block(&mut self, block: &mut [u8]);
}

struct Encryptor<T>(T);

impl<T: BlockEncryptMut + Send> BlockCore for Encryptor<T> {
    fn process_block(&mut self, block: &mut [u8]) {
        self.0.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

struct Decryptor<T>(T);

impl<T: BlockDecryptMut + Send> BlockCore for Decryptor<T> {
    fn process_block(&mut self, block: &mut [u8]) {
        self.0.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

trait Keystream: Send {
    fn apply(&mut self, data: &mut [u8]);
}

impl<T: StreamCipher + Send> Keystream for T {
    fn apply(&mut self, data: &mut [u8]) {
        self.apply_keystream(data);
    }
}

enum Mode {
    Block(Box<dyn BlockCore>),
    Stream(Box<dyn Keystream>),
}

impl Mode {
    fn encryptor<T: BlockEncryptMut + Send + 'static>(inner: T) -> Self {
        Self::Block(Box::new(Encryptor(inner)))
    }

    fn decryptor<T: BlockDecryptMut + Send + 'static>(inner: T) -> Self {
        Self::Block(Box::new(Decryptor(inner)))
    }

    fn stream<T: StreamCipher + Send + 'static>(inner: T) -> Self {
        Self::Stream(Box::new(inner))
    }

    fn build(
        algorithm: Algorithm,
        direction: Direction,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Option<Self>, InvalidLength> {
        use Direction::{Decrypt, Encrypt};

        let mode = match (algorithm, direction) {
            (Algorithm::Aes128Cbc, Encrypt) => {
                Self::encryptor(cbc::Encryptor::<Aes128>::new_from_slices(key, iv)?)
            },
            (Algorithm::Aes128Cbc, Decrypt) => {
                Self::decryptor(cbc::Decryptor::<Aes128>::new_from_slices(key, iv)?)
            },
            (Algorithm::Aes192Cbc, Encrypt) => {
                Self::encryptor(cbc::Encryptor::<Aes192>::new_from_slices(key, iv)?)
            },
            (Algorithm::Aes192Cbc, Decrypt) => {
                Self::decryptor(cbc::Decryptor::<Aes192>::new_from_slices(key, iv)?)
            },
            (Algorithm::Aes256Cbc, Encrypt) => {
                Self::encryptor(cbc::Encryptor::<Aes256>::new_from_slices(key, iv)?)
            },
            (Algorithm::Aes256Cbc, Decrypt) => {
                Self::decryptor(cbc::Decryptor::<Aes256>::new_from_slices(key, iv)?)
            },
            (Algorithm::Aes128Ecb, Encrypt) => {
                Self::encryptor(ecb::Encryptor::<Aes128>::new_from_slice(key)?)
            },
            (Algorithm::Aes128Ecb, Decrypt) => {
                Self::decryptor(ecb::Decryptor::<Aes128>::new_from_slice(key)?)
            },
            (Algorithm::Aes256Ecb, Encrypt) => {
                Self::encryptor(ecb::Encryptor::<Aes256>::new_from_slice(key)?)
            },
            (Algorithm::Aes256Ecb, Decrypt) => {
                Self::decryptor(ecb::Decryptor::<Aes256>::new_from_slice(key)?)
            },
            // Keystream modes are their own inverse
            (Algorithm::Aes128Ctr, _) => {
                Self::stream(ctr::Ctr128BE::<Aes128>::new_from_slices(key, iv)?)
            },
            (Algorithm::Aes192Ctr, _) => {
                Self::stream(ctr::Ctr128BE::<Aes192>::new_from_slices(key, iv)?)
            },
            (Algorithm::Aes256Ctr, _) => {
                Self::stream(ctr::Ctr128BE::<Aes256>::new_from_slices(key, iv)?)
            },
            (Algorithm::ChaCha20, _) => Self::stream(ChaCha20::new_from_slices(key, iv)?),
            (Algorithm::Aes128Gcm | Algorithm::Aes256Gcm | Algorithm::ChaCha20Poly1305, _) => {
                return Ok(None);
            },
        };

        Ok(Some(mode))
    }
}

/// Owned cipher engine handle.
///
/// Built for one (key, IV, direction) triple. Rebuilding is the only way to
/// change the IV; there is no in-place re-key.
pub(crate) struct CipherContext {
    mode: Mode,
    direction: Direction,
    padding: bool,
    block_size: usize,
    /// Partial (or held-back) block, never longer than one block after
    /// `update` returns
    buffer: Vec<u8>,
}

impl CipherContext {
    pub(crate) fn new(
        descriptor: &CipherDescriptor,
        direction: Direction,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Self, CipherError> {
        let mode = Mode::build(descriptor.algorithm(), direction, key, iv)
            .map_err(|_| CipherError::CipherInit { cipher: descriptor.name() })?
            .ok_or_else(|| CipherError::InvalidConfiguration {
                reason: format!("{} is an AEAD and has no streaming context", descriptor.name()),
            })?;

        Ok(Self {
            mode,
            direction,
            padding: descriptor.pads(),
            block_size: descriptor.block_size(),
            buffer: Vec::with_capacity(descriptor.block_size()),
        })
    }

    /// Bytes currently held in the partial-block buffer.
    pub(crate) fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn update(&mut self, input: &[u8]) -> Vec<u8> {
        match &mut self.mode {
            Mode::Stream(keystream) => {
                let mut out = input.to_vec();
                keystream.apply(&mut out);
                out
            },
            Mode::Block(core) => {
                let bs = self.block_size;
                self.buffer.extend_from_slice(input);

                let mut ready = self.buffer.len() / bs * bs;
                if self.direction == Direction::Decrypt
                    && self.padding
                    && ready == self.buffer.len()
                    && ready > 0
                {
                    ready -= bs;
                }

                let mut out: Vec<u8> = self.buffer.drain(..ready).collect();
                for block in out.chunks_exact_mut(bs) {
                    core.process_block(block);
                }
                out
            },
        }
    }

    pub(crate) fn finalize(&mut self) -> Result<Vec<u8>, CipherError> {
        let bs = self.block_size;
        let Mode::Block(core) = &mut self.mode else {
            return Ok(Vec::new());
        };

        let mut block = std::mem::take(&mut self.buffer);

        match (self.direction, self.padding) {
            (_, false) => {
                if block.is_empty() {
                    Ok(block)
                } else {
                    let buffered = block.len();
                    block.zeroize();
                    Err(CipherError::IncompleteBlock { buffered, block_size: bs })
                }
            },
            (Direction::Encrypt, true) => {
                let pad = bs - block.len();
                block.resize(bs, pad as u8);
                core.process_block(&mut block);
                Ok(block)
            },
            (Direction::Decrypt, true) => {
                // Nothing was decrypted since the last boundary
                if block.is_empty() {
                    return Ok(block);
                }
                if block.len() != bs {
                    let buffered = block.len();
                    block.zeroize();
                    return Err(CipherError::IncompleteBlock { buffered, block_size: bs });
                }

                core.process_block(&mut block);
                let pad = usize::from(block[bs - 1]);
                let valid = (1..=bs).contains(&pad)
                    && block[bs - pad..].iter().all(|&b| usize::from(b) == pad);
                if !valid {
                    block.zeroize();
                    return Err(CipherError::BadPadding);
                }

                block.truncate(bs - pad);
                Ok(block)
            },
        }
    }
}

impl Drop for CipherContext {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}
