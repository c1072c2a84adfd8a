//! Key-value persistence capability consumed by the contact gateway.
//!
//! # Responsibility
//! - Define the minimal get/set/remove contract over string blobs.
//! - Provide a durable SQLite backend and an in-memory backend.
//!
//! # Invariants
//! - `set` replaces any prior value under the key.
//! - `remove` of an absent key succeeds.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod memory;
pub mod sqlite;

pub type KvResult<T> = Result<T, KvError>;

/// Failure reported by a key-value backend.
#[derive(Debug)]
pub enum KvError {
    Db(DbError),
    /// Backend-specific failure without a richer type.
    Backend(String),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Backend(message) => write!(f, "key-value backend failure: {message}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Backend(_) => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// String blob storage addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> KvResult<()>;
    fn remove(&self, key: &str) -> KvResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        (**self).remove(key)
    }
}

pub use memory::InMemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
