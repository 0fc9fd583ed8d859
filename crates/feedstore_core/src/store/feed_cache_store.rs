//! SQLite-backed single-slot feed cache.
//!
//! # Responsibility
//! - Run retrieve/insert/delete against the cache slot on a private worker.
//! - Translate every backend fault into the completion's error channel.
//!
//! # Invariants
//! - Jobs run one at a time in submission order; no two operations on the
//!   same store interleave.
//! - Each completion fires exactly once, never on the submitting thread.
//! - A failed write leaves the last committed state untouched.

use super::config::StoreConfig;
use super::error::{StoreError, StoreResult};
use crate::db::{open_db_in_memory, open_db_with_timeout};
use crate::model::feed_item::LocalFeedItem;
use crate::repo::cache_repo::{
    delete_cache, find_cache, insert_items, unique_instance, RepoResult,
};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Outcome of reading the cache slot.
#[derive(Debug)]
pub enum RetrieveResult {
    Empty,
    Found {
        items: Vec<LocalFeedItem>,
        timestamp: DateTime<Utc>,
    },
    Failure(StoreError),
}

pub type RetrievalCompletion = Box<dyn FnOnce(RetrieveResult) + Send + 'static>;
pub type InsertionCompletion = Box<dyn FnOnce(StoreResult<()>) + Send + 'static>;
pub type DeletionCompletion = Box<dyn FnOnce(StoreResult<()>) + Send + 'static>;

/// Asynchronous single-slot feed cache contract.
pub trait FeedStore: Send + Sync {
    fn retrieve(&self, completion: RetrievalCompletion);
    fn insert(
        &self,
        items: Vec<LocalFeedItem>,
        timestamp: DateTime<Utc>,
        completion: InsertionCompletion,
    );
    fn delete(&self, completion: DeletionCompletion);
}

enum Job {
    Retrieve(RetrievalCompletion),
    Insert {
        items: Vec<LocalFeedItem>,
        timestamp: DateTime<Utc>,
        completion: InsertionCompletion,
    },
    Delete(DeletionCompletion),
}

impl Job {
    fn event(&self) -> &'static str {
        match self {
            Self::Retrieve(_) => "cache_retrieve",
            Self::Insert { .. } => "cache_insert",
            Self::Delete(_) => "cache_delete",
        }
    }

    fn run(self, conn: &mut Connection) {
        let event = self.event();
        match self {
            Self::Retrieve(completion) => {
                let result = retrieve_cache(conn);
                deliver(event, move || completion(result));
            }
            Self::Insert {
                items,
                timestamp,
                completion,
            } => {
                let result = insert_cache(conn, &items, timestamp);
                deliver(event, move || completion(result));
            }
            Self::Delete(completion) => {
                let result = delete_cached_feed(conn);
                deliver(event, move || completion(result));
            }
        }
    }

    fn fail(self, err: StoreError) {
        let event = self.event();
        match self {
            Self::Retrieve(completion) => {
                deliver(event, move || completion(RetrieveResult::Failure(err)))
            }
            Self::Insert { completion, .. } => deliver(event, move || completion(Err(err))),
            Self::Delete(completion) => deliver(event, move || completion(Err(err))),
        }
    }
}

/// Feed cache backed by one SQLite file and one private worker thread.
///
/// The connection lives on the worker; callers only ever submit jobs.
pub struct FeedCacheStore {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl FeedCacheStore {
    /// Opens (or creates) the store at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Opens (or creates) the store at `path`.
    ///
    /// # Errors
    /// - `StoreError::Initialization` when the file cannot be opened, its
    ///   schema version is newer than supported, or the cache tables are
    ///   missing.
    /// - `StoreError::WorkerSpawn` when the worker thread cannot start.
    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let conn = open_db_with_timeout(path, config.busy_timeout)?;
        Self::spawn(conn, &config.worker_name)
    }

    /// Opens a store over a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        Self::spawn(conn, &StoreConfig::default().worker_name)
    }

    fn spawn(conn: Connection, worker_name: &str) -> StoreResult<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(worker_name.to_string())
            .spawn(move || run_worker(conn, receiver))
            .map_err(StoreError::WorkerSpawn)?;

        info!("event=store_open module=store status=ok worker={worker_name}");
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    fn submit(&self, job: Job) {
        let job = match &self.sender {
            Some(sender) => match sender.send(job) {
                Ok(()) => return,
                Err(SendError(job)) => job,
            },
            None => job,
        };

        // Only reachable if the worker died outside a completion; the job
        // still owes its caller exactly one completion.
        warn!(
            "event={} module=store status=error error_code=worker_unavailable",
            job.event()
        );
        fail_detached(job);
    }
}

impl FeedStore for FeedCacheStore {
    fn retrieve(&self, completion: RetrievalCompletion) {
        self.submit(Job::Retrieve(completion));
    }

    fn insert(
        &self,
        items: Vec<LocalFeedItem>,
        timestamp: DateTime<Utc>,
        completion: InsertionCompletion,
    ) {
        self.submit(Job::Insert {
            items,
            timestamp,
            completion,
        });
    }

    fn delete(&self, completion: DeletionCompletion) {
        self.submit(Job::Delete(completion));
    }
}

impl Drop for FeedCacheStore {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued jobs and exit.
        drop(self.sender.take());

        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.thread().id() == thread::current().id() {
            return;
        }
        if worker.join().is_err() {
            error!("event=store_close module=store status=error error_code=worker_panicked");
        }
    }
}

fn run_worker(mut conn: Connection, receiver: Receiver<Job>) {
    debug!("event=worker_start module=store status=ok");
    for job in receiver {
        job.run(&mut conn);
    }
    debug!("event=worker_stop module=store status=ok");
}

fn retrieve_cache(conn: &mut Connection) -> RetrieveResult {
    let started_at = Instant::now();
    match load_cached_feed(conn) {
        Ok(Some((items, timestamp))) => {
            info!(
                "event=cache_retrieve module=store status=ok outcome=found items={} duration_ms={}",
                items.len(),
                started_at.elapsed().as_millis()
            );
            RetrieveResult::Found { items, timestamp }
        }
        Ok(None) => {
            info!(
                "event=cache_retrieve module=store status=ok outcome=empty duration_ms={}",
                started_at.elapsed().as_millis()
            );
            RetrieveResult::Empty
        }
        Err(err) => {
            error!(
                "event=cache_retrieve module=store status=error duration_ms={} error_code=read_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            RetrieveResult::Failure(StoreError::Read(err))
        }
    }
}

/// Reads the slot row and its items inside one deferred transaction so both
/// come from the same committed snapshot.
fn load_cached_feed(
    conn: &mut Connection,
) -> RepoResult<Option<(Vec<LocalFeedItem>, DateTime<Utc>)>> {
    let tx = conn.transaction()?;
    let found = find_cache(&tx)?;
    tx.commit()?;

    let Some(cache) = found else {
        return Ok(None);
    };
    let items = cache.local_feed()?;
    Ok(Some((items, cache.timestamp)))
}

fn insert_cache(
    conn: &mut Connection,
    items: &[LocalFeedItem],
    timestamp: DateTime<Utc>,
) -> StoreResult<()> {
    let started_at = Instant::now();
    let result = in_write_transaction(conn, "cache_insert", |tx| {
        let cache_id = unique_instance(tx, timestamp)?;
        insert_items(tx, cache_id, items)
    });

    match result {
        Ok(()) => {
            info!(
                "event=cache_insert module=store status=ok items={} duration_ms={}",
                items.len(),
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=cache_insert module=store status=error items={} duration_ms={} error_code=write_failed error={}",
                items.len(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(StoreError::Write(err))
        }
    }
}

fn delete_cached_feed(conn: &mut Connection) -> StoreResult<()> {
    let started_at = Instant::now();
    match in_write_transaction(conn, "cache_delete", |tx| delete_cache(tx)) {
        Ok(removed) => {
            info!(
                "event=cache_delete module=store status=ok removed={} duration_ms={}",
                removed,
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=cache_delete module=store status=error duration_ms={} error_code=write_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(StoreError::Write(err))
        }
    }
}

/// Runs `work` in an immediate transaction, committing on success and
/// rolling back on any error.
fn in_write_transaction<T>(
    conn: &mut Connection,
    event: &str,
    work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match work(&tx) {
        Ok(value) => {
            // A failed commit drops `tx`, which rolls back.
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event={event} module=store status=error error_code=rollback_failed error={rollback_err}"
                );
            }
            Err(err)
        }
    }
}

fn deliver(event: &'static str, completion: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(completion)).is_err() {
        error!("event={event} module=store status=error error_code=completion_panicked");
    }
}

fn fail_detached(job: Job) {
    let spawned = thread::Builder::new()
        .name("feedstore-fallback".to_string())
        .spawn(move || job.fail(StoreError::WorkerUnavailable));
    if let Err(err) = spawned {
        error!("event=store_submit module=store status=error error_code=fallback_spawn_failed error={err}");
    }
}
