//! Environment abstraction for deterministic testing.
//!
//! Engines never call the OS RNG directly. IVs and nonces are drawn through
//! [`Environment`], so simulation can substitute a seeded generator and
//! production uses [`SystemEnv`].

use thiserror::Error;

/// Entropy source failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("entropy source failed: {0}")]
pub struct EntropyError(pub String);

/// Abstract environment providing randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Failures are reported, never papered over with weak bytes
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError>;

    /// Allocates `len` random bytes.
    ///
    /// Convenience for IVs and nonces whose length is only known at runtime.
    fn random_vec(&self, len: usize) -> Result<Vec<u8>, EntropyError> {
        let mut bytes = vec![0u8; len];
        self.random_bytes(&mut bytes)?;
        Ok(bytes)
    }
}

/// Production environment backed by the OS RNG (getrandom).
///
/// # Security
///
/// getrandom provides OS-level cryptographic randomness (e.g. `getrandom(2)`
/// on Linux, `BCryptGenRandom` on Windows), suitable for IVs and AEAD nonces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::fill(buffer).map_err(|e| EntropyError(e.to_string()))
    }
}

/// Deterministic environment for unit tests.
///
/// Each call fills the whole buffer with one counter byte, starting at 1, so
/// consecutive IVs differ and are easy to recognise in assertions.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct CountingEnv {
    counter: std::sync::Arc<std::sync::atomic::AtomicU8>,
}

#[cfg(test)]
impl Environment for CountingEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        let byte = self.counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed).wrapping_add(1);
        buffer.fill(byte);
        Ok(())
    }
}

/// Environment whose entropy source always fails.
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FailingEnv;

#[cfg(test)]
impl Environment for FailingEnv {
    fn random_bytes(&self, _buffer: &mut [u8]) -> Result<(), EntropyError> {
        Err(EntropyError("source closed".to_string()))
    }
}
