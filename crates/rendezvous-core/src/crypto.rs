//! Cryptographic primitives for the rendezvous store.
//!
//! Provides two things:
//!   1. The per-epoch nonce — 16 random bytes identifying one store lifetime
//!   2. BLAKE3 keyed hashing — the integrity tag carried by discovery cookies
//!
//! The cookie key is derived from the nonce with BLAKE3's key derivation mode,
//! so a nonce never doubles as a raw MAC key. There is no unsafe code here.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 16;

/// Context string for deriving the cookie MAC key from a nonce.
/// Changing it invalidates every cookie ever issued.
const COOKIE_KEY_CONTEXT: &str = "rendezvous 2024-01-01 discovery cookie tag v1";

// ── Nonce ─────────────────────────────────────────────────────────────────────

/// Random value bound to one storage epoch.
///
/// Generated once per durable store and persisted; generated fresh for
/// every in-memory store.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Draw a fresh nonce from the OS random source.
    ///
    /// Fails instead of falling back to anything predictable.
    pub fn generate() -> Result<Self, NonceError> {
        let mut bytes = [0u8; NONCE_LEN];
        OsRng.try_fill_bytes(&mut bytes).map_err(NonceError::Rng)?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Rebuild a nonce from a stored blob. None if the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; NONCE_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    /// First 4 bytes as hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({}..)", self.short())
    }
}

// ── Cookie tag ────────────────────────────────────────────────────────────────

/// Keyed BLAKE3 tag over a cookie's counter and namespace.
///
///   key = BLAKE3-derive-key(context, nonce)
///   tag = BLAKE3-keyed(key, counter_be || namespace)
///
/// The counter is fixed width, so the concatenation is unambiguous.
/// Comparing two `blake3::Hash` values is constant-time.
pub fn cookie_tag(nonce: &Nonce, counter: u64, namespace: &str) -> blake3::Hash {
    let key = blake3::derive_key(COOKIE_KEY_CONTEXT, nonce.as_bytes());
    let mut hasher = blake3::Hasher::new_keyed(&key);
    hasher.update(&counter.to_be_bytes());
    hasher.update(namespace.as_bytes());
    hasher.finalize()
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NonceError {
    #[error("OS random source failed: {0}")]
    Rng(rand::Error),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
