//! Message engines.
//!
//! Messages are grouped into segments. Each segment starts with a message
//! carrying an `iv` and ends with one carrying `final`:
//!
//! ```text
//!   [iv=a] m1   m2   [final] m3   [iv=b] m4 ...
//!   └──────── segment a ───────┘  └── segment b
//! ```
//!
//! A new `iv` arriving while a segment is still open closes the old segment
//! implicitly; see [`MessageDecryptEngine::handle`].

mod decrypt;
mod encrypt;

pub use decrypt::MessageDecryptEngine;
pub use encrypt::MessageEncryptEngine;
