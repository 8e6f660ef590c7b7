//! Property-based tests for the message engines
//!
//! These tests verify:
//!
//! 1. **Segmentation**: encrypted messages decrypt one-to-one, with the same
//!    payloads and the same non-protocol metadata, across CBOR encoding
//! 2. **Fail closed**: flipping any bit of an AEAD ciphertext, tag or nonce
//!    is rejected
//! 3. **Rekey flush**: a dropped `final` never loses plaintext; the receiver
//!    flushes it when the next IV arrives

use ciborium::Value;
use proptest::prelude::*;
use tagcrypt_core::{
    AuthDecryptEngine, AuthEncryptEngine, CipherDescriptor, CipherError, CipherKind, EngineError,
    META_FINAL, META_IV, META_TAG, Message, MessageDecryptEngine, MessageEncryptEngine,
};
use tagcrypt_harness::SimEnv;

fn message_cipher() -> impl Strategy<Value = (&'static str, bool)> {
    prop_oneof![
        Just(("aes-128-cbc", true)),
        Just(("aes-256-cbc", true)),
        Just(("aes-128-cbc", false)),
        Just(("aes-128-ecb", true)),
        Just(("aes-128-ctr", false)),
        Just(("chacha20", false)),
    ]
}

fn aead_cipher() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("aes-128-gcm"), Just("aes-256-gcm"), Just("chacha20-poly1305")]
}

/// Plaintext messages: (blocks, tail, final). Non-final block payloads stay
/// aligned; final payloads may carry a tail when padding is on.
fn messages() -> impl Strategy<Value = Vec<(usize, usize, bool)>> {
    prop::collection::vec((1usize..4, 0usize..16, any::<bool>()), 1..10)
}

fn build(desc: &CipherDescriptor, shape: &[(usize, usize, bool)]) -> Vec<Message> {
    let block = if desc.kind() == CipherKind::Block { desc.block_size() } else { 1 };
    let last = shape.len() - 1;
    shape
        .iter()
        .enumerate()
        .map(|(i, &(blocks, tail, fin))| {
            let closes = fin || i == last;
            let tail = if closes && desc.pads() { tail } else { 0 };
            let payload: Vec<u8> = (0..blocks * block + tail).map(|b| (b + i) as u8).collect();
            let msg = Message::data(payload).with_meta("seq", i as u64);
            if closes { msg.with_final() } else { msg }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_message_segmentation_roundtrip(
        (name, padding) in message_cipher(),
        shape in messages(),
        seed in any::<u64>(),
    ) {
        let desc = CipherDescriptor::lookup(name, padding).unwrap();
        let key = vec![0x6Bu8; desc.key_len()];
        let mut enc = MessageEncryptEngine::new(&desc, &key, SimEnv::with_seed(seed)).unwrap();
        let mut dec = MessageDecryptEngine::new(&desc, &key).unwrap();

        let inputs = build(&desc, &shape);
        let mut received = Vec::new();
        for input in &inputs {
            let wire = enc.handle(input.clone()).unwrap().encode().unwrap();
            received.extend(dec.handle_bytes(&wire).unwrap());
        }

        // Padded decrypt delays the last block of each message to the next
        // one, so compare the concatenated payloads
        let sent: Vec<u8> = inputs.iter().flat_map(|m| m.payload.clone()).collect();
        let got: Vec<u8> = received.iter().flat_map(|m| m.payload.clone()).collect();
        prop_assert_eq!(got, sent);

        prop_assert_eq!(received.len(), inputs.len());
        for (input, output) in inputs.iter().zip(&received) {
            prop_assert_eq!(output.metadata.get("seq"), input.metadata.get("seq"));
            prop_assert!(!output.has(META_IV));
            prop_assert!(!output.has(META_FINAL));
        }
    }

    #[test]
    fn prop_aead_bit_flip_rejected(
        name in aead_cipher(),
        payload in prop::collection::vec(any::<u8>(), 1..200),
        target in 0usize..3,
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
        seed in any::<u64>(),
    ) {
        let desc = CipherDescriptor::lookup(name, false).unwrap();
        let key = vec![0x90u8; desc.key_len()];
        let env = SimEnv::with_seed(seed);
        let mut enc =
            AuthEncryptEngine::new(&desc, &key, desc.key_len(), desc.iv_len(), env).unwrap();
        let mut dec = AuthDecryptEngine::new(&desc, &key).unwrap();

        let mut sealed = enc.handle(Message::data(payload.clone())).unwrap();
        prop_assert_eq!(&dec.handle(sealed.clone()).unwrap().payload, &payload);

        let field = match target {
            0 => &mut sealed.payload,
            1 => match sealed.metadata.get_mut(META_TAG) {
                Some(Value::Bytes(tag)) => tag,
                _ => unreachable!(),
            },
            _ => match sealed.metadata.get_mut(META_IV) {
                Some(Value::Bytes(nonce)) => nonce,
                _ => unreachable!(),
            },
        };
        let i = index.index(field.len());
        field[i] ^= 1 << bit;

        prop_assert_eq!(
            dec.handle(sealed),
            Err(EngineError::Cipher(CipherError::AuthenticationFailed))
        );
    }
}

#[test]
fn dropped_final_is_flushed_by_next_iv() {
    let desc = CipherDescriptor::lookup("aes-256-cbc", true).unwrap();
    let key = [0x12u8; 32];
    let mut enc = MessageEncryptEngine::new(&desc, &key, SimEnv::with_seed(99)).unwrap();
    let mut dec = MessageDecryptEngine::new(&desc, &key).unwrap();

    let mut first = enc.handle(Message::data(b"first segment".to_vec()).with_final()).unwrap();
    first.metadata.remove(META_FINAL);
    let second = enc.handle(Message::data(b"second".to_vec()).with_final()).unwrap();

    let mut out = dec.handle(first).unwrap();
    out.extend(dec.handle(second).unwrap());

    let payloads: Vec<&[u8]> = out.iter().map(|m| m.payload.as_slice()).collect();
    assert_eq!(payloads, vec![&b""[..], &b"first segment"[..], &b"second"[..]]);
}
