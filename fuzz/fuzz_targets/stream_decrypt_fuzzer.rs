//! Fuzz target for stream decryption with hostile annotations
//!
//! # Strategy
//!
//! - Fuzzed windows with IV annotations at arbitrary offsets and lengths
//!
//! # Invariants
//!
//! - NEVER panic on out-of-window or wrong-length annotations
//! - Position advances only by the length of accepted windows; a rejected
//!   window leaves it unchanged
//! - CTR output length always equals input length

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tagcrypt_core::{CipherDescriptor, StreamAnnotation, StreamDecryptEngine};

#[derive(Debug, Arbitrary)]
struct Window {
    data: Vec<u8>,
    ivs: Vec<(u16, Vec<u8>)>,
}

fuzz_target!(|windows: Vec<Window>| {
    let desc = CipherDescriptor::lookup("aes-128-ctr", false).expect("catalog cipher");
    let mut engine = StreamDecryptEngine::new(&desc, &[0u8; 16]).expect("valid key");

    for window in windows.into_iter().take(32) {
        let before = engine.position();
        let annotations: Vec<StreamAnnotation> = window
            .ivs
            .iter()
            .map(|(delta, iv)| StreamAnnotation::iv(before + u64::from(*delta), iv))
            .collect();

        match engine.process(&window.data, &annotations) {
            Ok(chunk) => {
                assert_eq!(chunk.data.len(), window.data.len());
                assert_eq!(engine.position(), before + window.data.len() as u64);
            }
            Err(_) => assert_eq!(engine.position(), before),
        }
    }
});
