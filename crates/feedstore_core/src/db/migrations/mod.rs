//! Bundled feed cache schema and its verification.
//!
//! # Responsibility
//! - Register the schema script in strictly increasing version order.
//! - Apply pending scripts atomically.
//! - Check that every table and column the cache reads is present.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_feed_cache.sql"),
}];

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("feed_cache", &["id", "timestamp"]),
    (
        "feed_items",
        &["cache_id", "position", "id", "description", "location", "url"],
    ),
];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending schema scripts on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

/// Verifies that the feed cache tables and columns exist.
///
/// # Errors
/// - `DbError::SchemaNotFound` naming the first missing table or column.
pub fn ensure_schema_ready(conn: &Connection) -> DbResult<()> {
    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(DbError::SchemaNotFound {
                table,
                column: None,
            });
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(DbError::SchemaNotFound {
                    table,
                    column: Some(column),
                });
            }
        }
    }
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM pragma_table_info(?1)
            WHERE name = ?2
        );",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
