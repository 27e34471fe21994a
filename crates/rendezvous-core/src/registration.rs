//! Registration types and the limits that apply to them.
//!
//! A registration is one (peer, namespace) advertisement. The store keeps at
//! most one row per pair; re-registering overwrites the record and moves the
//! row to the end of discovery order by assigning a fresh sequence number.

use std::fmt;

/// Sequence number assigned to a registration at upsert time.
///
/// Strictly increasing per store and never reused. Only the low 63 bits are
/// usable so the value fits a signed SQLite integer.
pub type Seq = u64;

/// Largest sequence number the store will ever hand out.
pub const MAX_SEQ: Seq = i64::MAX as u64;

/// Locator that selects an ephemeral in-memory store.
/// Any other locator is treated as a filesystem path.
pub const MEMORY_LOCATOR: &str = ":memory:";

/// Default interval between background expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 120;

/// Default cap on the number of registrations returned by one discover call.
pub const DEFAULT_MAX_DISCOVER_LIMIT: u64 = 1000;

/// Default upper bound on a registration TTL (72 hours).
pub const DEFAULT_MAX_TTL_SECS: u64 = 72 * 60 * 60;

/// Default upper bound on namespace length, in bytes.
pub const DEFAULT_MAX_NAMESPACE_LEN: usize = 255;

// ── Peer identity ─────────────────────────────────────────────────────────────

/// Opaque identifier of an advertising peer.
///
/// Decoding and validating the identifier is the caller's job; the store
/// only compares and returns the raw bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(Vec<u8>);

impl PeerId {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// First 8 bytes as hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..self.0.len().min(8)])
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.short())
    }
}

// ── Registration ──────────────────────────────────────────────────────────────

/// A live registration as returned by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The advertising peer.
    pub peer: PeerId,
    /// Namespace the peer registered under. Never empty.
    pub namespace: String,
    /// Signed address record, returned verbatim.
    pub signed_record: Vec<u8>,
    /// Seconds left before the registration expires. Always at least 1.
    pub ttl_secs: u64,
}
