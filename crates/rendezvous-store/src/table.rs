//! The registration table — (peer, namespace) → (record, expiry, seq).
//!
//! Every method runs against a connection the caller already holds
//! exclusively, so one call observes and produces one consistent state.
//! Sequence numbers come from `SeqAllocator` and are persisted in the same
//! transaction as the row they are written to.

use rendezvous_core::registration::{Seq, MAX_SEQ};
use rendezvous_core::{PeerId, Registration};
use rusqlite::{params, Connection};

use crate::error::StoreError;

// ── Sequence allocator ────────────────────────────────────────────────────────

/// Monotonic sequence source. `next` only proposes a value; the value is
/// consumed by `commit` once the write that uses it has committed.
#[derive(Debug)]
pub(crate) struct SeqAllocator {
    last: Seq,
}

impl SeqAllocator {
    pub(crate) fn new(last: Seq) -> Self {
        Self { last }
    }

    pub(crate) fn next(&self) -> Result<Seq, StoreError> {
        if self.last >= MAX_SEQ {
            return Err(StoreError::SeqExhausted);
        }
        Ok(self.last + 1)
    }

    pub(crate) fn commit(&mut self, seq: Seq) {
        debug_assert!(seq > self.last);
        self.last = seq;
    }

    pub(crate) fn last(&self) -> Seq {
        self.last
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// A stored row as read back for discovery.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub registration: Registration,
    pub seq: Seq,
}

pub(crate) struct RegistrationTable {
    conn: Connection,
    seq: SeqAllocator,
}

impl RegistrationTable {
    pub(crate) fn new(conn: Connection, last_seq: Seq) -> Self {
        Self {
            conn,
            seq: SeqAllocator::new(last_seq),
        }
    }

    /// Upsert a registration that expires at `expiry` (unix seconds).
    ///
    /// An existing (peer, namespace) row gets the new record, expiry, and a
    /// fresh sequence number, which moves it to the end of discovery order.
    pub(crate) fn upsert(
        &mut self,
        peer: &PeerId,
        namespace: &str,
        signed_record: &[u8],
        expiry: i64,
    ) -> Result<Seq, StoreError> {
        let seq = self.seq.next()?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE meta SET last_seq = ?1 WHERE id = 0",
            params![seq as i64],
        )?;
        tx.execute(
            "INSERT INTO registrations (peer, namespace, signed_record, expiry, seq)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (peer, namespace) DO UPDATE SET
                 signed_record = excluded.signed_record,
                 expiry = excluded.expiry,
                 seq = excluded.seq",
            params![peer.as_bytes(), namespace, signed_record, expiry, seq as i64],
        )?;
        tx.commit()?;

        self.seq.commit(seq);
        Ok(seq)
    }

    /// Delete one (peer, namespace) row, or every row for the peer when
    /// `namespace` is empty. Returns the number of rows removed.
    pub(crate) fn remove(&self, peer: &PeerId, namespace: &str) -> Result<usize, StoreError> {
        let removed = if namespace.is_empty() {
            self.conn.execute(
                "DELETE FROM registrations WHERE peer = ?1",
                params![peer.as_bytes()],
            )?
        } else {
            self.conn.execute(
                "DELETE FROM registrations WHERE peer = ?1 AND namespace = ?2",
                params![peer.as_bytes(), namespace],
            )?
        };
        Ok(removed)
    }

    /// Live (not yet expired at `now`) registrations held by a peer.
    pub(crate) fn count_live(&self, peer: &PeerId, now: i64) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM registrations WHERE peer = ?1 AND expiry > ?2",
            params![peer.as_bytes(), now],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Delete every row whose expiry is at or before `now`.
    pub(crate) fn sweep_expired(&self, now: i64) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .execute("DELETE FROM registrations WHERE expiry <= ?1", params![now])?)
    }

    /// Live rows with `seq > after`, ascending by seq, at most `limit` of them.
    /// An empty `namespace` scans every namespace.
    pub(crate) fn page_after(
        &self,
        namespace: &str,
        after: Seq,
        now: i64,
        limit: u64,
    ) -> Result<Vec<Row>, StoreError> {
        let limit = limit.min(i64::MAX as u64) as i64;
        let rows = if namespace.is_empty() {
            let mut stmt = self.conn.prepare_cached(
                "SELECT peer, namespace, signed_record, expiry, seq FROM registrations
                 WHERE seq > ?1 AND expiry > ?2
                 ORDER BY seq ASC LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(params![after as i64, now, limit], |row| read_row(row, now))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = self.conn.prepare_cached(
                "SELECT peer, namespace, signed_record, expiry, seq FROM registrations
                 WHERE namespace = ?4 AND seq > ?1 AND expiry > ?2
                 ORDER BY seq ASC LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(params![after as i64, now, limit, namespace], |row| {
                    read_row(row, now)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        Ok(rows)
    }

    pub(crate) fn last_seq(&self) -> Seq {
        self.seq.last()
    }

    pub(crate) fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Sql(e))
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn read_row(row: &rusqlite::Row<'_>, now: i64) -> rusqlite::Result<Row> {
    let peer: Vec<u8> = row.get(0)?;
    let expiry: i64 = row.get(3)?;
    let seq: i64 = row.get(4)?;
    Ok(Row {
        registration: Registration {
            peer: PeerId::from_bytes(peer),
            namespace: row.get(1)?,
            signed_record: row.get(2)?,
            ttl_secs: (expiry - now).max(1) as u64,
        },
        seq: seq as Seq,
    })
}
