//! Engine configuration.
//!
//! Plain data with `serde` support so a host can carry engine settings in its
//! own config format. Key material is deliberately absent: keys are always
//! passed to constructors directly.

use serde::{Deserialize, Serialize};
use tagcrypt_crypto::CipherDescriptor;

use crate::error::EngineError;

/// Cipher used when none is configured.
pub const DEFAULT_CIPHER: &str = "aes-256-ctr";

/// Cipher selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherConfig {
    /// Catalog name, e.g. `aes-128-cbc`
    pub cipher: String,
    /// Request PKCS#7 padding (block ciphers, message engines only)
    #[serde(default)]
    pub padding: bool,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self { cipher: DEFAULT_CIPHER.to_string(), padding: false }
    }
}

impl CipherConfig {
    /// Resolve against the catalog.
    pub fn descriptor(&self) -> Result<CipherDescriptor, EngineError> {
        Ok(CipherDescriptor::lookup(&self.cipher, self.padding)?)
    }
}

/// Tagged-stream settings shared by the stream engines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Annotation key marking packet starts (value: packet length, u64 BE).
    /// Annotations under this key are forwarded with their offsets intact.
    #[serde(default)]
    pub packet_len_key: Option<String>,
}

impl StreamConfig {
    /// Config with a packet-length annotation key.
    pub fn with_packet_len_key(key: impl Into<String>) -> Self {
        Self { packet_len_key: Some(key.into()) }
    }
}
