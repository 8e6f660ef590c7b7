//! Fuzz target for message PDU decoding
//!
//! # Strategy
//!
//! - Random bytes: arbitrary input straight into the CBOR decoder
//! - Shaped PDUs: well-formed CBOR arrays with fuzzed element types
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Anything that decodes re-encodes to a stable byte form

#![no_main]

use arbitrary::Arbitrary;
use ciborium::Value;
use libfuzzer_sys::fuzz_target;
use tagcrypt_core::Message;

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(Vec<u8>),
    Shaped { keys: Vec<(String, Vec<u8>)>, payload: Vec<u8>, null_meta: bool, extra: bool },
}

fuzz_target!(|input: Input| {
    let decoded = match input {
        Input::Raw(bytes) => Message::decode(&bytes),
        Input::Shaped { keys, payload, null_meta, extra } => {
            let meta = if null_meta {
                Value::Null
            } else {
                let entries = keys.into_iter().map(|(k, v)| (Value::Text(k), Value::Bytes(v)));
                Value::Map(entries.collect())
            };
            let mut items = vec![meta, Value::Bytes(payload)];
            if extra {
                items.push(Value::Null);
            }
            Message::from_value(Value::Array(items))
        }
    };

    if let Ok(message) = decoded {
        let bytes = message.encode().expect("decoded message must re-encode");
        let again = Message::decode(&bytes).expect("re-encoded message must decode");
        // Byte comparison: metadata may hold NaN floats
        assert_eq!(again.encode().expect("re-encode"), bytes);
    }
});
