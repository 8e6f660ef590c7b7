//! Tagged-stream engines.
//!
//! A stream is a continuous byte sequence delivered in arbitrary windows.
//! Side information travels as [`StreamAnnotation`]s keyed by absolute stream
//! offset:
//!
//! ```text
//! offset:  0              n                         m
//! bytes:   |==== IV a ====|========= IV b ==========|===>
//! tags:    iv=a           iv=b
//! ```
//!
//! The encryptor emits an `iv` annotation wherever it starts a new IV; the
//! decryptor rotates its session at exactly those offsets.

mod decrypt;
mod encrypt;

pub use decrypt::StreamDecryptEngine;
pub use encrypt::StreamEncryptEngine;

use crate::{annotation::StreamAnnotation, error::EngineError};

/// Annotations must land inside `start..=end` of the window they arrive with.
fn check_window(annotation: &StreamAnnotation, start: u64, end: u64) -> Result<(), EngineError> {
    if (start..=end).contains(&annotation.offset) {
        Ok(())
    } else {
        Err(EngineError::AnnotationOutOfWindow { offset: annotation.offset, start, end })
    }
}
