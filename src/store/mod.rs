//! Backing store contract and the SQLite implementation
//!
//! The request handler only needs three primitive operations over the
//! `key_value` table; anything that can express them can stand behind the
//! pool. Adapters are not thread-safe on their own; concurrency comes from
//! holding exactly one adapter per pooled connection.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::types::Key;

/// The only surface the request handler requires of the backing store
pub trait KeyValueStore {
    /// Current value for the key, or `None` when the row is absent
    ///
    /// Absence is not an error; store failures are.
    fn get(&mut self, key: Key) -> Result<Option<String>, StoreError>;

    /// Insert the value for the key, replacing any existing row
    fn upsert(&mut self, key: Key, value: &str) -> Result<(), StoreError>;

    /// Remove the row for the key; a missing key is a successful no-op
    fn delete(&mut self, key: Key) -> Result<(), StoreError>;
}
