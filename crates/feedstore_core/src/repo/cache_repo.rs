//! Cache slot records and their SQLite mapping.
//!
//! # Responsibility
//! - Define `CacheRecord` and `FeedItemRecord` as stored in `feed_cache` and
//!   `feed_items`.
//! - Provide find, delete and unique-instance primitives that run inside a
//!   caller-owned transaction.
//!
//! # Invariants
//! - Items are written with `position` equal to their input index and read
//!   back ordered by `position`.
//! - Deleting a cache row removes its items first, then the row.
//! - `unique_instance` leaves exactly one cache row behind.

use crate::db::DbError;
use crate::model::feed_item::LocalFeedItem;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for cache slot persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted cache data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// The single persisted cache slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    /// Row id in `feed_cache`; fresh for every insert.
    pub row_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Ordered by `position`.
    pub items: Vec<FeedItemRecord>,
}

impl CacheRecord {
    /// Converts owned item rows to transfer values, preserving order.
    ///
    /// Fails on the first row that cannot be decoded; no partial feed is
    /// returned.
    pub fn local_feed(&self) -> RepoResult<Vec<LocalFeedItem>> {
        self.items.iter().map(FeedItemRecord::to_local).collect()
    }
}

/// One `feed_items` row, kept in its stored text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItemRecord {
    pub position: i64,
    pub id: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: String,
}

impl FeedItemRecord {
    pub fn from_local(item: &LocalFeedItem, position: usize) -> RepoResult<Self> {
        let position = i64::try_from(position).map_err(|_| {
            RepoError::InvalidData(format!("item position {position} exceeds storage range"))
        })?;

        Ok(Self {
            position,
            id: item.id.to_string(),
            description: item.description.clone(),
            location: item.location.clone(),
            url: item.url.to_string(),
        })
    }

    pub fn to_local(&self) -> RepoResult<LocalFeedItem> {
        let id = Uuid::parse_str(&self.id).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{}` in feed_items.id", self.id))
        })?;
        let url = Url::parse(&self.url).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid url at feed_items.position {}: {err}",
                self.position
            ))
        })?;

        Ok(LocalFeedItem {
            id,
            description: self.description.clone(),
            location: self.location.clone(),
            url,
        })
    }
}

/// Loads the cache slot and its ordered items, if one exists.
pub fn find_cache(conn: &Connection) -> RepoResult<Option<CacheRecord>> {
    let found = conn
        .query_row(
            "SELECT id, timestamp FROM feed_cache ORDER BY id ASC LIMIT 1;",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, DateTime<Utc>>(1)?)),
        )
        .optional()?;

    let Some((row_id, timestamp)) = found else {
        return Ok(None);
    };

    Ok(Some(CacheRecord {
        row_id,
        timestamp,
        items: load_items(conn, row_id)?,
    }))
}

/// Deletes every cache row together with its items.
///
/// Returns the number of cache rows removed; `0` means the slot was empty.
pub fn delete_cache(conn: &Connection) -> RepoResult<usize> {
    let row_ids = cache_row_ids(conn)?;
    for row_id in &row_ids {
        conn.execute("DELETE FROM feed_items WHERE cache_id = ?1;", [row_id])?;
        conn.execute("DELETE FROM feed_cache WHERE id = ?1;", [row_id])?;
    }
    Ok(row_ids.len())
}

/// Replaces whatever occupies the slot with a fresh, item-less cache row.
///
/// Returns the new row id, to be passed to [`insert_items`].
pub fn unique_instance(conn: &Connection, timestamp: DateTime<Utc>) -> RepoResult<i64> {
    delete_cache(conn)?;
    conn.execute(
        "INSERT INTO feed_cache (timestamp) VALUES (?1);",
        params![timestamp],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Writes `items` under `cache_id` in input order.
pub fn insert_items(conn: &Connection, cache_id: i64, items: &[LocalFeedItem]) -> RepoResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO feed_items (
            cache_id,
            position,
            id,
            description,
            location,
            url
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
    )?;

    for (position, item) in items.iter().enumerate() {
        let record = FeedItemRecord::from_local(item, position)?;
        stmt.execute(params![
            cache_id,
            record.position,
            record.id,
            record.description,
            record.location,
            record.url,
        ])?;
    }

    Ok(())
}

fn cache_row_ids(conn: &Connection) -> RepoResult<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM feed_cache ORDER BY id ASC;")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn load_items(conn: &Connection, cache_id: i64) -> RepoResult<Vec<FeedItemRecord>> {
    let mut stmt = conn.prepare(
        "SELECT position, id, description, location, url
         FROM feed_items
         WHERE cache_id = ?1
         ORDER BY position ASC;",
    )?;
    let items = stmt
        .query_map([cache_id], parse_item_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

fn parse_item_row(row: &Row<'_>) -> rusqlite::Result<FeedItemRecord> {
    Ok(FeedItemRecord {
        position: row.get("position")?,
        id: row.get("id")?,
        description: row.get("description")?,
        location: row.get("location")?,
        url: row.get("url")?,
    })
}
