//! Fuzz target for the message decrypt state machine
//!
//! # Strategy
//!
//! - Sequences of messages with fuzzed payloads, IVs of any length, and
//!   random `final` markers
//! - Padded and unpadded CBC plus CTR, so flushes and padding checks run
//!
//! # Invariants
//!
//! - NEVER panic, whatever the message order
//! - An empty payload is rejected; a well-formed IV on it still opens a
//!   segment, otherwise whether a segment is open is unchanged
//! - A well-formed IV always leaves a segment open, even when the old
//!   segment could not be finalized
//! - After a successful `final` (IV-bearing cipher) the engine needs a new IV

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tagcrypt_core::{CipherDescriptor, EngineError, Message, MessageDecryptEngine};

#[derive(Debug, Arbitrary)]
struct Step {
    payload: Vec<u8>,
    iv: Option<Vec<u8>>,
    fin: bool,
}

#[derive(Debug, Arbitrary)]
struct Input {
    cipher: u8,
    steps: Vec<Step>,
}

const CIPHERS: [(&str, bool); 4] =
    [("aes-128-cbc", true), ("aes-128-cbc", false), ("aes-128-ctr", false), ("chacha20", false)];

fuzz_target!(|input: Input| {
    let (name, padding) = CIPHERS[usize::from(input.cipher) % CIPHERS.len()];
    let desc = CipherDescriptor::lookup(name, padding).expect("catalog cipher");
    let mut engine =
        MessageDecryptEngine::new(&desc, &vec![0u8; desc.key_len()]).expect("valid key");

    for step in input.steps.into_iter().take(64) {
        let was_open = engine.has_valid_iv();
        let empty = step.payload.is_empty();
        let rekey = step.iv.as_ref().is_some_and(|iv| iv.len() == desc.iv_len());

        let mut message = Message::data(step.payload);
        if let Some(iv) = step.iv {
            message = message.with_iv(&iv);
        }
        if step.fin {
            message = message.with_final();
        }

        let result = engine.handle(message);
        if empty {
            assert_eq!(result, Err(EngineError::EmptyPayload));
            assert_eq!(engine.has_valid_iv(), was_open || rekey);
        } else if rekey && !step.fin {
            assert!(engine.has_valid_iv());
        } else if step.fin && result.is_ok() {
            assert!(!engine.has_valid_iv());
        }
    }
});
