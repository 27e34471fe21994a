//! Schema creation and the single-row metadata record.
//!
//! The metadata row holds the store nonce and the highest sequence number
//! ever issued. Both survive restarts of a durable store, which is what keeps
//! old cookies meaningful: the nonce still authenticates them and no later
//! registration can reuse a sequence number they point past.

use std::path::Path;
use std::time::Duration;

use rendezvous_core::registration::{Seq, MAX_SEQ, MEMORY_LOCATOR};
use rendezvous_core::Nonce;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS meta (
        id INTEGER PRIMARY KEY CHECK (id = 0),
        nonce BLOB NOT NULL,
        last_seq INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS registrations (
        peer BLOB NOT NULL,
        namespace TEXT NOT NULL CHECK (namespace <> ''),
        signed_record BLOB NOT NULL,
        expiry INTEGER NOT NULL,
        seq INTEGER NOT NULL UNIQUE,
        PRIMARY KEY (peer, namespace)
    );
    CREATE INDEX IF NOT EXISTS registrations_ns_seq_idx ON registrations(namespace, seq);
    CREATE INDEX IF NOT EXISTS registrations_expiry_idx ON registrations(expiry);
";

/// Whether a locator names the ephemeral in-memory store.
pub fn is_memory(locator: &str) -> bool {
    locator == MEMORY_LOCATOR
}

/// Open the SQLite connection a locator names and make sure the schema exists.
pub(crate) fn open_connection(locator: &str) -> Result<Connection, StoreError> {
    let conn = if is_memory(locator) {
        Connection::open_in_memory()?
    } else {
        let conn = Connection::open(Path::new(locator))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn
    };
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Load the nonce and sequence high-water mark, creating them on first open.
pub(crate) fn load_or_create_meta(conn: &Connection) -> Result<(Nonce, Seq), StoreError> {
    let row: Option<(Vec<u8>, i64)> = conn
        .query_row("SELECT nonce, last_seq FROM meta WHERE id = 0", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()?;

    // Rows written before the meta row existed still count toward the mark.
    let max_row_seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) FROM registrations",
        [],
        |row| row.get(0),
    )?;

    match row {
        Some((nonce, last_seq)) => {
            let nonce = Nonce::from_slice(&nonce).ok_or_else(|| {
                StoreError::CorruptMetadata(format!("nonce is {} bytes", nonce.len()))
            })?;
            let last = last_seq.max(max_row_seq);
            if last < 0 || last as u64 > MAX_SEQ {
                return Err(StoreError::CorruptMetadata(format!("last_seq {last}")));
            }
            Ok((nonce, last as Seq))
        }
        None => {
            let nonce = Nonce::generate()?;
            conn.execute(
                "INSERT INTO meta (id, nonce, last_seq) VALUES (0, ?1, ?2)",
                params![nonce.as_bytes().as_slice(), max_row_seq],
            )?;
            Ok((nonce, max_row_seq.max(0) as Seq))
        }
    }
}
