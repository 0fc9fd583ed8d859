//! Single-slot persistent cache for image feeds.
//! This crate owns the cache slot invariants: one snapshot, replaced
//! atomically, read back in insertion order.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::feed_item::{FeedItemId, LocalFeedItem};
pub use repo::cache_repo::{CacheRecord, FeedItemRecord, RepoError, RepoResult};
pub use store::{
    DeletionCompletion, FeedCacheStore, FeedStore, InsertionCompletion, RetrievalCompletion,
    RetrieveResult, StoreConfig, StoreError, StoreResult,
};
