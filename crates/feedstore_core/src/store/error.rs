use crate::db::DbError;
use crate::repo::cache_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

pub type StoreResult<T> = Result<T, StoreError>;

/// Faults surfaced by the cache store.
#[derive(Debug)]
pub enum StoreError {
    /// The database could not be opened or lacks the cache schema.
    Initialization(DbError),
    /// The private worker thread could not be started.
    WorkerSpawn(io::Error),
    /// Looking up or decoding the cache slot failed; nothing was changed.
    Read(RepoError),
    /// Writing the cache slot failed; the transaction was rolled back.
    Write(RepoError),
    /// The worker thread has stopped and can no longer run jobs.
    WorkerUnavailable,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialization(err) => write!(f, "failed to open feed store: {err}"),
            Self::WorkerSpawn(err) => write!(f, "failed to start feed store worker: {err}"),
            Self::Read(err) => write!(f, "failed to read cached feed: {err}"),
            Self::Write(err) => write!(f, "failed to write cached feed: {err}"),
            Self::WorkerUnavailable => write!(f, "feed store worker is not running"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Initialization(err) => Some(err),
            Self::WorkerSpawn(err) => Some(err),
            Self::Read(err) => Some(err),
            Self::Write(err) => Some(err),
            Self::WorkerUnavailable => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Initialization(value)
    }
}
