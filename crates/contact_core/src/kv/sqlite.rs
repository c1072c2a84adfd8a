//! Durable key-value backend on SQLite.
//!
//! # Invariants
//! - One row per key in `kv_entries`; writes are upserts.
//! - The connection is used by one caller at a time.

use super::{KeyValueStore, KvResult};
use crate::db::{open_db, open_db_in_memory, DbError, DbResult, EntryOp};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// SQLite-backed key-value store owning its connection.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Opens the database file at `path`, applying migrations.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already went through `db::open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(DbError::entry(EntryOp::Get, key))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        self.conn().execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )
        .map_err(DbError::entry(EntryOp::Set, key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        self.conn()
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])
            .map_err(DbError::entry(EntryOp::Remove, key))?;
        Ok(())
    }
}
