//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by the cache store.
//! - Apply and verify the schema before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections carry the complete feed cache schema.

use super::migrations::{apply_migrations, ensure_schema_ready};
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file with the default busy timeout.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

/// Opens a SQLite database file and applies the bundled schema.
///
/// # Side effects
/// - Creates the file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_with_timeout(
    path: impl AsRef<Path>,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let conn = Connection::open(path).map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        err
    })?;

    finish_open(conn, busy_timeout, "file", started_at)
}

/// Opens a private in-memory SQLite database and applies the bundled schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let conn = Connection::open_in_memory().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        err
    })?;

    finish_open(conn, DEFAULT_BUSY_TIMEOUT, "memory", started_at)
}

fn finish_open(
    mut conn: Connection,
    busy_timeout: Duration,
    mode: &str,
    started_at: Instant,
) -> DbResult<Connection> {
    match bootstrap_connection(&mut conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    ensure_schema_ready(conn)?;
    Ok(())
}
