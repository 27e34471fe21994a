//! The store handle — lifecycle plus the operations the protocol layer calls.
//!
//! All table access goes through one async mutex, so every call sees a single
//! consistent state and writes never interleave. The background sweeper takes
//! the same lock for the length of one DELETE.

use std::sync::Arc;
use std::time::Duration;

use rendezvous_core::config::RendezvousConfig;
use rendezvous_core::registration::{
    Seq, DEFAULT_MAX_DISCOVER_LIMIT, DEFAULT_MAX_NAMESPACE_LEN, DEFAULT_MAX_TTL_SECS,
    DEFAULT_SWEEP_INTERVAL_SECS,
};
use rendezvous_core::{Clock, Nonce, PeerId, SystemClock};
use tokio::sync::Mutex;

use crate::discovery::{self, DiscoverPage};
use crate::error::StoreError;
use crate::schema;
use crate::sweeper::Sweeper;
use crate::table::RegistrationTable;

/// The table as shared with the sweeper. `None` once the store is closed.
///
/// An async mutex so callers queued behind a long page scan or sweep park as
/// tasks and are served in FIFO order. No guard is held across an `.await`.
pub(crate) type SharedTable = Arc<Mutex<Option<RegistrationTable>>>;

// ── Options ───────────────────────────────────────────────────────────────────

/// Tunables fixed for the lifetime of an open store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How often the background sweeper runs.
    pub sweep_interval: Duration,
    /// Cap on registrations per discover call. Larger or zero limits are clamped to it.
    pub max_discover_limit: u64,
    /// Longest TTL accepted by `register`.
    pub max_ttl_secs: u64,
    /// Longest namespace accepted by `register`, in bytes.
    pub max_namespace_len: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            max_discover_limit: DEFAULT_MAX_DISCOVER_LIMIT,
            max_ttl_secs: DEFAULT_MAX_TTL_SECS,
            max_namespace_len: DEFAULT_MAX_NAMESPACE_LEN,
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &RendezvousConfig) -> Self {
        Self {
            sweep_interval: config.store.sweep_interval(),
            max_discover_limit: config.limits.max_discover_limit.max(1),
            max_ttl_secs: config.limits.max_ttl_secs,
            max_namespace_len: config.limits.max_namespace_len,
        }
    }

    fn clamp_limit(&self, limit: u64) -> u64 {
        let cap = self.max_discover_limit.max(1);
        if limit == 0 {
            cap
        } else {
            limit.min(cap)
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

struct StoreInner {
    table: SharedTable,
    sweeper: Mutex<Option<Sweeper>>,
    nonce: Nonce,
    clock: Arc<dyn Clock>,
    options: StoreOptions,
    locator: String,
}

/// Registration/discovery store. Cheap to clone; clones share one store.
#[derive(Clone)]
pub struct RendezvousStore {
    inner: Arc<StoreInner>,
}

impl RendezvousStore {
    /// Open a store with default options and the system clock.
    ///
    /// `":memory:"` opens a fresh ephemeral store; anything else is a path to
    /// a durable store, created if missing. Must be called inside a tokio
    /// runtime: the expiry sweeper is spawned here.
    pub async fn open(locator: &str) -> Result<Self, StoreError> {
        Self::open_with(locator, StoreOptions::default(), Arc::new(SystemClock)).await
    }

    pub async fn open_with(
        locator: &str,
        options: StoreOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let conn = schema::open_connection(locator)?;
        let (nonce, last_seq) = schema::load_or_create_meta(&conn)?;

        let table: SharedTable = Arc::new(Mutex::new(Some(RegistrationTable::new(
            conn, last_seq,
        ))));
        let sweeper = Sweeper::spawn(table.clone(), clock.clone(), options.sweep_interval);

        tracing::info!(
            locator,
            durable = !schema::is_memory(locator),
            nonce = %nonce.short(),
            last_seq,
            "rendezvous store opened"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                table,
                sweeper: Mutex::new(Some(sweeper)),
                nonce,
                clock,
                options,
                locator: locator.to_string(),
            }),
        })
    }

    /// Stop the sweeper and release the database.
    ///
    /// Returns `Closed` if the store was already closed.
    pub async fn close(&self) -> Result<(), StoreError> {
        let sweeper = self.inner.sweeper.lock().await.take();
        let Some(sweeper) = sweeper else {
            return Err(StoreError::Closed);
        };
        sweeper.stop().await;

        let table = self.inner.table.lock().await.take();
        let Some(table) = table else {
            return Err(StoreError::Closed);
        };
        let last_seq = table.last_seq();
        table.close()?;
        tracing::info!(locator = %self.inner.locator, last_seq, "rendezvous store closed");
        Ok(())
    }

    /// The epoch nonce cookies are bound to.
    pub fn nonce(&self) -> Nonce {
        self.inner.nonce
    }

    pub fn is_durable(&self) -> bool {
        !schema::is_memory(&self.inner.locator)
    }

    /// Upsert a registration that lives for `ttl_secs` from now.
    ///
    /// Returns the sequence number assigned to the row.
    pub async fn register(
        &self,
        peer: &PeerId,
        namespace: &str,
        signed_record: &[u8],
        ttl_secs: u64,
    ) -> Result<Seq, StoreError> {
        let opts = &self.inner.options;
        if ttl_secs == 0 {
            return Err(StoreError::InvalidTtl);
        }
        if ttl_secs > opts.max_ttl_secs {
            return Err(StoreError::TtlTooLong {
                ttl: ttl_secs,
                max: opts.max_ttl_secs,
            });
        }
        if namespace.is_empty() {
            return Err(StoreError::EmptyNamespace);
        }
        if namespace.len() > opts.max_namespace_len {
            return Err(StoreError::NamespaceTooLong {
                len: namespace.len(),
                max: opts.max_namespace_len,
            });
        }

        let mut guard = self.inner.table.lock().await;
        let table = guard.as_mut().ok_or(StoreError::Closed)?;

        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let expiry = self.inner.clock.now_secs().saturating_add(ttl);
        let seq = table.upsert(peer, namespace, signed_record, expiry)?;

        tracing::debug!(peer = %peer.short(), namespace, ttl_secs, seq, "registered");
        Ok(seq)
    }

    /// Remove a registration. An empty namespace removes every namespace
    /// the peer is registered under. Removing nothing is not an error.
    pub async fn unregister(&self, peer: &PeerId, namespace: &str) -> Result<(), StoreError> {
        let guard = self.inner.table.lock().await;
        let table = guard.as_ref().ok_or(StoreError::Closed)?;

        let removed = table.remove(peer, namespace)?;
        tracing::debug!(peer = %peer.short(), namespace, removed, "unregistered");
        Ok(())
    }

    /// Live registrations held by `peer`, across all namespaces.
    pub async fn count_registrations(&self, peer: &PeerId) -> Result<u64, StoreError> {
        let guard = self.inner.table.lock().await;
        let table = guard.as_ref().ok_or(StoreError::Closed)?;
        table.count_live(peer, self.inner.clock.now_secs())
    }

    /// Fetch the next page of live registrations.
    ///
    /// An empty `namespace` discovers across all namespaces. `cookie` is the
    /// value returned by the previous page for the same namespace, or None to
    /// start over. A cookie that does not decode, or that belongs to another
    /// namespace or store, fails the call without running the query.
    pub async fn discover(
        &self,
        namespace: &str,
        cookie: Option<&[u8]>,
        limit: u64,
    ) -> Result<DiscoverPage, StoreError> {
        let limit = self.inner.options.clamp_limit(limit);

        let guard = self.inner.table.lock().await;
        let table = guard.as_ref().ok_or(StoreError::Closed)?;

        discovery::discover(
            table,
            &self.inner.nonce,
            namespace,
            cookie,
            limit,
            self.inner.clock.now_secs(),
        )
    }

    /// Delete expired registrations now. Returns how many were removed.
    pub async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let guard = self.inner.table.lock().await;
        let table = guard.as_ref().ok_or(StoreError::Closed)?;

        let removed = table.sweep_expired(self.inner.clock.now_secs())?;
        if removed > 0 {
            tracing::debug!(removed, "expired registrations swept on demand");
        }
        Ok(removed)
    }
}
