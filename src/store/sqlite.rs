//! SQLite-backed key-value adapter

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::StoreError;
use crate::types::Key;

use super::KeyValueStore;

const CREATE_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS key_value (key INTEGER PRIMARY KEY, value TEXT NOT NULL)";
const DROP_TABLE_SQL: &str = "DROP TABLE IF EXISTS key_value";
const UPSERT_SQL: &str = "INSERT INTO key_value (key, value) VALUES (?1, ?2) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";
const SELECT_SQL: &str = "SELECT value FROM key_value WHERE key = ?1";
const DELETE_SQL: &str = "DELETE FROM key_value WHERE key = ?1";

/// One SQLite connection plus its prepared-statement cache
///
/// Opened in WAL mode so concurrent pool connections to the same file do
/// not serialize readers behind the writer. One instance lives behind each
/// pooled connection; the `&mut self` receivers make the single-owner
/// discipline explicit.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(Duration::from_secs(5))?;
        // journal_mode returns the resulting mode as a row
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.set_prepared_statement_cache_capacity(16);
        debug!(path = %path.as_ref().display(), journal_mode = %mode, "Store connection opened");
        Ok(Self { conn })
    }

    /// Create the `key_value` table if it does not exist yet
    pub fn bootstrap(&self) -> Result<(), StoreError> {
        self.conn.execute(CREATE_TABLE_SQL, [])?;
        Ok(())
    }

    /// Drop and recreate the `key_value` table, discarding all rows
    pub fn reset(&self) -> Result<(), StoreError> {
        self.conn.execute(DROP_TABLE_SQL, [])?;
        self.bootstrap()
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&mut self, key: Key) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare_cached(SELECT_SQL)?;
        let value = stmt
            .query_row(params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn upsert(&mut self, key: Key, value: &str) -> Result<(), StoreError> {
        let mut stmt = self.conn.prepare_cached(UPSERT_SQL)?;
        stmt.execute(params![key, value])?;
        Ok(())
    }

    fn delete(&mut self, key: Key) -> Result<(), StoreError> {
        let mut stmt = self.conn.prepare_cached(DELETE_SQL)?;
        // Zero affected rows is fine: deleting a missing key is a no-op
        stmt.execute(params![key])?;
        Ok(())
    }
}
