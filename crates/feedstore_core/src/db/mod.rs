//! SQLite storage bootstrap and schema entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the feed cache.
//! - Apply the bundled schema and verify it before any cache access.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Cache rows must not be read or written before the schema check passes.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_timeout};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A table or column the cache depends on is absent after bootstrap.
    SchemaNotFound {
        table: &'static str,
        column: Option<&'static str>,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotFound {
                table,
                column: None,
            } => write!(f, "feed cache schema not found: missing table `{table}`"),
            Self::SchemaNotFound {
                table,
                column: Some(column),
            } => write!(
                f,
                "feed cache schema not found: missing column `{table}.{column}`"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::SchemaNotFound { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
