//! Cipher catalog and descriptors.
//!
//! A [`CipherDescriptor`] is resolved once from an OpenSSL-style name (e.g.
//! `aes-128-cbc`) and a padding flag. It carries the fixed parameters of the
//! algorithm and is shared by every session built from it.

use crate::error::CipherError;

/// Tag length of every AEAD in the catalog.
pub const AEAD_TAG_LEN: usize = 16;

/// How an algorithm consumes its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherKind {
    /// Block mode: input is processed in `block_size` units, partial blocks
    /// are buffered and padding applies
    Block,
    /// Keystream mode: any input length, output length equals input length
    Stream,
    /// Authenticated encryption over a whole message
    Aead,
}

/// Algorithm handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// AES-128 in CBC mode
    Aes128Cbc,
    /// AES-192 in CBC mode
    Aes192Cbc,
    /// AES-256 in CBC mode
    Aes256Cbc,
    /// AES-128 in ECB mode (no IV)
    Aes128Ecb,
    /// AES-256 in ECB mode (no IV)
    Aes256Ecb,
    /// AES-128 in CTR mode, 128-bit big-endian counter
    Aes128Ctr,
    /// AES-192 in CTR mode, 128-bit big-endian counter
    Aes192Ctr,
    /// AES-256 in CTR mode, 128-bit big-endian counter
    Aes256Ctr,
    /// `ChaCha20` (IETF, 96-bit nonce)
    ChaCha20,
    /// AES-128-GCM
    Aes128Gcm,
    /// AES-256-GCM
    Aes256Gcm,
    /// `ChaCha20-Poly1305` (IETF)
    ChaCha20Poly1305,
}

struct CatalogEntry {
    name: &'static str,
    algorithm: Algorithm,
    kind: CipherKind,
    key_len: usize,
    iv_len: usize,
    block_size: usize,
}

const CATALOG: &[CatalogEntry] = &[
    entry("aes-128-cbc", Algorithm::Aes128Cbc, CipherKind::Block, 16, 16, 16),
    entry("aes-192-cbc", Algorithm::Aes192Cbc, CipherKind::Block, 24, 16, 16),
    entry("aes-256-cbc", Algorithm::Aes256Cbc, CipherKind::Block, 32, 16, 16),
    entry("aes-128-ecb", Algorithm::Aes128Ecb, CipherKind::Block, 16, 0, 16),
    entry("aes-256-ecb", Algorithm::Aes256Ecb, CipherKind::Block, 32, 0, 16),
    entry("aes-128-ctr", Algorithm::Aes128Ctr, CipherKind::Stream, 16, 16, 1),
    entry("aes-192-ctr", Algorithm::Aes192Ctr, CipherKind::Stream, 24, 16, 1),
    entry("aes-256-ctr", Algorithm::Aes256Ctr, CipherKind::Stream, 32, 16, 1),
    entry("chacha20", Algorithm::ChaCha20, CipherKind::Stream, 32, 12, 1),
    entry("aes-128-gcm", Algorithm::Aes128Gcm, CipherKind::Aead, 16, 12, 1),
    entry("aes-256-gcm", Algorithm::Aes256Gcm, CipherKind::Aead, 32, 12, 1),
    entry("chacha20-poly1305", Algorithm::ChaCha20Poly1305, CipherKind::Aead, 32, 12, 1),
];

const fn entry(
    name: &'static str,
    algorithm: Algorithm,
    kind: CipherKind,
    key_len: usize,
    iv_len: usize,
    block_size: usize,
) -> CatalogEntry {
    CatalogEntry { name, algorithm, kind, key_len, iv_len, block_size }
}

/// Immutable description of a cipher algorithm.
///
/// # Invariants
///
/// - `key_len`, `iv_len` and `block_size` are properties of the algorithm and
///   never change after lookup.
/// - Every key and IV handed to a session built from this descriptor must
///   match these lengths exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherDescriptor {
    name: &'static str,
    algorithm: Algorithm,
    kind: CipherKind,
    key_len: usize,
    iv_len: usize,
    block_size: usize,
    padding: bool,
}

impl CipherDescriptor {
    /// Resolve a cipher by name. Matching is case-insensitive.
    ///
    /// # Errors
    ///
    /// - `UnknownCipher` if the name is not in the catalog
    pub fn lookup(name: &str, padding: bool) -> Result<Self, CipherError> {
        let entry = CATALOG
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CipherError::UnknownCipher { name: name.to_string() })?;

        Ok(Self {
            name: entry.name,
            algorithm: entry.algorithm,
            kind: entry.kind,
            key_len: entry.key_len,
            iv_len: entry.iv_len,
            block_size: entry.block_size,
            padding,
        })
    }

    /// Names of every cipher in the catalog.
    pub fn names() -> impl Iterator<Item = &'static str> {
        CATALOG.iter().map(|e| e.name)
    }

    /// Canonical catalog name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Algorithm handle.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Input discipline of the algorithm.
    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    /// Key length in bytes.
    pub fn key_len(&self) -> usize {
        self.key_len
    }

    /// IV (nonce) length in bytes. Zero for IV-less ciphers.
    pub fn iv_len(&self) -> usize {
        self.iv_len
    }

    /// Block size in bytes. One for stream and AEAD ciphers.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether PKCS#7 padding was requested.
    pub fn padding_enabled(&self) -> bool {
        self.padding
    }

    /// Whether padding actually applies. Only block ciphers pad.
    pub fn pads(&self) -> bool {
        self.padding && self.kind == CipherKind::Block
    }

    /// Authentication tag length. Zero for unauthenticated ciphers.
    pub fn tag_len(&self) -> usize {
        if self.kind == CipherKind::Aead { AEAD_TAG_LEN } else { 0 }
    }

    /// Whether this descriptor names an AEAD.
    pub fn is_aead(&self) -> bool {
        self.kind == CipherKind::Aead
    }
}
