//! SQLite bootstrap for the on-device key-value backend.
//!
//! # Responsibility
//! - Open and configure the connection behind `kv::sqlite`.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No key-value access happens before migrations succeed.
//! - Every error names the database, schema step, or entry it concerns.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Key-value statement that touched the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOp {
    Get,
    Set,
    Remove,
}

impl EntryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug)]
pub enum DbError {
    /// The database at `target` (a file path or `:memory:`) could not be
    /// opened or configured.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// Moving the schema to `version` failed; nothing was committed.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A statement against one `kv_entries` row failed.
    Entry {
        op: EntryOp,
        key: String,
        source: rusqlite::Error,
    },
}

impl DbError {
    pub(crate) fn entry(op: EntryOp, key: &str) -> impl FnOnce(rusqlite::Error) -> Self + '_ {
        move |source| Self::Entry {
            op,
            key: key.to_string(),
            source,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "cannot open contacts database `{target}`: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "cannot migrate contacts database to schema {version}: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "contacts database schema {db_version} is newer than supported {latest_supported}"
            ),
            Self::Entry { op, key, source } => {
                write!(f, "kv {} of `{key}` failed: {source}", op.as_str())
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Migration { source, .. }
            | Self::Entry { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}
