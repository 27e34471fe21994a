use rendezvous_core::cookie::CookieError;
use rendezvous_core::crypto::NonceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    // ── Invalid input ────────────────────────────────────────────────────────
    #[error("ttl must be positive")]
    InvalidTtl,

    #[error("ttl {ttl}s exceeds maximum {max}s")]
    TtlTooLong { ttl: u64, max: u64 },

    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("namespace is {len} bytes, maximum is {max}")]
    NamespaceTooLong { len: usize, max: usize },

    // ── Invalid cursor ───────────────────────────────────────────────────────
    #[error("malformed cookie: {0}")]
    MalformedCookie(#[from] CookieError),

    #[error("cookie was not issued for this namespace by this store")]
    InvalidCookie,

    // ── Lifecycle ────────────────────────────────────────────────────────────
    #[error("store is closed")]
    Closed,

    #[error("failed to generate store nonce: {0}")]
    Nonce(#[from] NonceError),

    #[error("corrupt store metadata: {0}")]
    CorruptMetadata(String),

    // ── Storage ──────────────────────────────────────────────────────────────
    #[error("sequence numbers exhausted")]
    SeqExhausted,

    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl StoreError {
    /// True for errors caused by the request itself rather than the store.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidTtl
                | Self::TtlTooLong { .. }
                | Self::EmptyNamespace
                | Self::NamespaceTooLong { .. }
        )
    }

    /// True for a cookie that failed to decode or to authenticate.
    pub fn is_invalid_cookie(&self) -> bool {
        matches!(self, Self::MalformedCookie(_) | Self::InvalidCookie)
    }
}
