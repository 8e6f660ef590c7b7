//! Discrete messages: metadata map plus payload bytes.
//!
//! On the wire a message is a two-element CBOR array:
//!
//! ```text
//! [ { "iv": h'…', "final": true, …other keys… } | null , h'…payload…' ]
//! ```
//!
//! A `null` metadata slot decodes to an empty map. Metadata keys must be text.
//! Values are arbitrary CBOR and are forwarded untouched unless an engine
//! consumes them.

use std::collections::BTreeMap;

use ciborium::Value;

use crate::error::EngineError;

/// Metadata key carrying a raw IV (or AEAD nonce).
pub const META_IV: &str = "iv";

/// Presence-only metadata key closing the current segment.
pub const META_FINAL: &str = "final";

/// Metadata key carrying a detached AEAD tag.
pub const META_TAG: &str = "tag";

/// Metadata key with additional authenticated data for AEAD engines.
pub const META_AAD: &str = "aad";

/// Message metadata. Ordered so encoding is deterministic.
pub type Metadata = BTreeMap<String, Value>;

/// A metadata-tagged message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    /// Side information; engines insert and remove protocol keys here
    pub metadata: Metadata,
    /// Payload bytes (plaintext or ciphertext depending on direction)
    pub payload: Vec<u8>,
}

impl Message {
    /// Create a message from metadata and payload.
    pub fn new(metadata: Metadata, payload: impl Into<Vec<u8>>) -> Self {
        Self { metadata, payload: payload.into() }
    }

    /// Create a message with empty metadata.
    pub fn data(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(Metadata::new(), payload)
    }

    /// Builder: set a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Builder: attach an IV.
    #[must_use]
    pub fn with_iv(self, iv: &[u8]) -> Self {
        self.with_meta(META_IV, Value::Bytes(iv.to_vec()))
    }

    /// Builder: mark as the last message of a segment.
    #[must_use]
    pub fn with_final(self) -> Self {
        self.with_meta(META_FINAL, Value::Bool(true))
    }

    /// Whether a metadata key is present (value ignored).
    pub fn has(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    /// Metadata value as bytes, if present and a byte string.
    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.metadata.get(key) {
            Some(Value::Bytes(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Convert into the CBOR PDU form.
    pub fn to_value(&self) -> Value {
        let map = self
            .metadata
            .iter()
            .map(|(k, v)| (Value::Text(k.clone()), v.clone()))
            .collect();
        Value::Array(vec![Value::Map(map), Value::Bytes(self.payload.clone())])
    }

    /// Parse a CBOR PDU.
    ///
    /// # Errors
    ///
    /// - `MalformedMessage` if the value is not a `[map|null, bytes]` pair or
    ///   a metadata key is not text
    pub fn from_value(value: Value) -> Result<Self, EngineError> {
        let Value::Array(items) = value else {
            return Err(EngineError::malformed("PDU is not an array"));
        };
        let Ok([meta, payload]) = <[Value; 2]>::try_from(items) else {
            return Err(EngineError::malformed("PDU is not a metadata/payload pair"));
        };

        let metadata = match meta {
            Value::Null => Metadata::new(),
            Value::Map(entries) => {
                let mut metadata = Metadata::new();
                for (k, v) in entries {
                    let Value::Text(key) = k else {
                        return Err(EngineError::malformed("metadata key is not text"));
                    };
                    metadata.insert(key, v);
                }
                metadata
            },
            _ => return Err(EngineError::malformed("metadata is not a map")),
        };

        let Value::Bytes(payload) = payload else {
            return Err(EngineError::malformed("payload is not a byte string"));
        };

        Ok(Self { metadata, payload })
    }

    /// Encode to CBOR bytes.
    pub fn encode(&self) -> Result<Vec<u8>, EngineError> {
        let mut out = Vec::new();
        ciborium::into_writer(&self.to_value(), &mut out)
            .map_err(|e| EngineError::malformed(format!("CBOR encode failed: {e}")))?;
        Ok(out)
    }

    /// Decode from CBOR bytes.
    ///
    /// # Errors
    ///
    /// - `MalformedMessage` if the bytes are not CBOR or not a PDU
    pub fn decode(bytes: &[u8]) -> Result<Self, EngineError> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| EngineError::malformed(format!("CBOR decode failed: {e}")))?;
        Self::from_value(value)
    }
}
