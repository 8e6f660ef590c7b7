//! tagcrypt engines
//!
//! Cipher engines that keep a sender and receiver in sync across a
//! segment-oriented transport. IV changes travel in-band, either as stream
//! annotations or as message metadata, so the receiver always knows which IV
//! applies to which bytes.
//!
//! # Engines
//!
//! | sender                  | receiver                | carrier          |
//! |-------------------------|-------------------------|------------------|
//! | [`StreamEncryptEngine`] | [`StreamDecryptEngine`] | tagged stream    |
//! | [`MessageEncryptEngine`]| [`MessageDecryptEngine`]| messages         |
//! | [`AuthEncryptEngine`]   | [`AuthDecryptEngine`]   | messages (AEAD)  |
//!
//! # Architecture
//!
//! Engines are synchronous state machines with `&mut self` entry points and
//! no I/O. Randomness comes from an injected [`Environment`]: [`SystemEnv`]
//! in production, a seeded generator in simulation.
//!
//! ```text
//! host runtime ──bytes/messages──> engine ──> CipherSession ──> RustCrypto
//!                                    │
//!                                    └──> Environment (IVs, nonces)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod annotation;
pub mod auth;
pub mod config;
pub mod env;
pub mod error;
pub mod message;
pub mod pdu;
pub mod stream;

pub use annotation::{StreamAnnotation, StreamChunk};
pub use auth::{AuthDecryptEngine, AuthEncryptEngine};
pub use config::{CipherConfig, StreamConfig};
pub use env::{EntropyError, Environment, SystemEnv};
pub use error::EngineError;
pub use message::{MessageDecryptEngine, MessageEncryptEngine};
pub use pdu::{META_AAD, META_FINAL, META_IV, META_TAG, Message, Metadata};
pub use stream::{StreamDecryptEngine, StreamEncryptEngine};
pub use tagcrypt_crypto::{CipherDescriptor, CipherError, CipherKind};
