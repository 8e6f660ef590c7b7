//! tagcrypt cipher layer
//!
//! Cipher descriptors, sessions and AEAD primitives shared by the tagcrypt
//! engines. Everything here is synchronous and free of I/O; randomness (IVs,
//! nonces) is always supplied by the caller.
//!
//! # Session Lifecycle
//!
//! ```text
//! name + padding flag
//!        │
//!        ▼
//! CipherDescriptor (catalog lookup, once)
//!        │
//!        ▼
//! CipherSession (key, IV, engine handle)
//!        │  init / rotate_iv
//!        ▼
//! update* → finalize → needs new IV
//! ```
//!
//! The engine handle is an owned `RustCrypto` mode instance. `rotate_iv` and
//! `finalize` are the only operations that replace or retire it.
//!
//! # Security
//!
//! - Key bytes are zeroized when a session is dropped
//! - Partial plaintext blocks are zeroized when a context is dropped
//! - AEAD verification fails closed; no plaintext on a bad tag

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod catalog;
mod context;
pub mod error;
pub mod session;

pub use aead::AeadCipher;
pub use catalog::{AEAD_TAG_LEN, Algorithm, CipherDescriptor, CipherKind};
pub use context::Direction;
pub use error::CipherError;
pub use session::CipherSession;
