//! Discovery cookies — opaque pagination cursors.
//!
//! A cookie says "resume after sequence number S". It is only meaningful for
//! the namespace it was issued under and the store epoch (nonce) that issued
//! it. The namespace is not carried inside the cookie; the caller supplies it
//! again on the next request and the tag is recomputed over it.
//!
//! Wire layout, 40 bytes:
//!
//!   counter: u64 big-endian   (8)
//!   tag:     BLAKE3 keyed MAC (32)
//!
//! Callers must run `valid` before trusting the counter returned by `unpack`.

use static_assertions::assert_eq_size;
use thiserror::Error;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::crypto::{cookie_tag, Nonce};
use crate::registration::MAX_SEQ;

/// Size of an encoded cookie in bytes.
pub const COOKIE_LEN: usize = 40;

#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
struct CookieLayout {
    counter: [u8; 8],
    tag: [u8; 32],
}

// Compile-time size guard. If this fails, issued cookies stop decoding.
assert_eq_size!(CookieLayout, [u8; COOKIE_LEN]);

/// Encode a cookie for `counter`, scoped to `namespace` and `nonce`.
pub fn pack(counter: u64, namespace: &str, nonce: &Nonce) -> Vec<u8> {
    let layout = CookieLayout {
        counter: counter.to_be_bytes(),
        tag: *cookie_tag(nonce, counter, namespace).as_bytes(),
    };
    layout.as_bytes().to_vec()
}

/// Check a cookie against the claimed namespace and the current nonce.
///
/// Returns false for anything that does not decode, and for any cookie whose
/// tag was not produced by this namespace and nonce.
pub fn valid(cookie: &[u8], namespace: &str, nonce: &Nonce) -> bool {
    let Some(layout) = CookieLayout::read_from(cookie) else {
        return false;
    };
    let counter = u64::from_be_bytes(layout.counter);
    blake3::Hash::from(layout.tag) == cookie_tag(nonce, counter, namespace)
}

/// Extract the counter without authenticating it.
pub fn unpack(cookie: &[u8]) -> Result<u64, CookieError> {
    let layout = CookieLayout::read_from(cookie).ok_or(CookieError::Malformed { len: cookie.len() })?;
    let counter = u64::from_be_bytes(layout.counter);
    if counter > MAX_SEQ {
        return Err(CookieError::CounterOutOfRange(counter));
    }
    Ok(counter)
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    #[error("malformed cookie: expected {} bytes, got {len}", COOKIE_LEN)]
    Malformed { len: usize },

    #[error("cookie counter {0} exceeds the sequence range")]
    CounterOutOfRange(u64),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
