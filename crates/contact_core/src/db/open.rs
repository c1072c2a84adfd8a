//! Connection bootstrap for the contacts database.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Every open attempt emits one `db_open` start event and one outcome event.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MEMORY_TARGET: &str = ":memory:";

/// Opens (or creates) a database file and applies pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with(path.display().to_string(), || Connection::open(path))
}

/// Opens a private in-memory database with migrations applied.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(MEMORY_TARGET.to_string(), Connection::open_in_memory)
}

fn open_with(
    target: String,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start target={target}");

    let result = connect()
        .and_then(|conn| configure(&conn).map(|()| conn))
        .map_err(|source| DbError::Open {
            target: target.clone(),
            source,
        })
        .and_then(|mut conn| apply_migrations(&mut conn).map(|()| conn));

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok target={target} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error target={target} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
    result
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA synchronous = FULL;")?;
    conn.busy_timeout(BUSY_TIMEOUT)
}
