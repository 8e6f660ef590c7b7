//! Authenticated message engines.
//!
//! Each message is sealed independently under a fresh random nonce:
//!
//! ```text
//! in:   { aad?: h'…', … }            plaintext
//! out:  { aad?: h'…', iv: nonce, tag: h'16 bytes', … }   ciphertext
//! ```
//!
//! An optional `aad` byte string is authenticated but not encrypted and is
//! forwarded unchanged so the receiver can verify it.

mod decrypt;
mod encrypt;

pub use decrypt::AuthDecryptEngine;
pub use encrypt::AuthEncryptEngine;

use crate::pdu::{META_AAD, Message};

/// Associated data for a message, empty when absent.
fn associated_data(message: &Message) -> Vec<u8> {
    message.bytes(META_AAD).map(<[u8]>::to_vec).unwrap_or_default()
}
