//! Asynchronous cache store over the SQLite repository primitives.
//!
//! # Responsibility
//! - Own the connection and the worker that serializes every operation.
//! - Expose the `FeedStore` contract consumed by cache orchestration.
//!
//! # Invariants
//! - At most one cache slot exists after any committed operation.
//! - Backend faults never escape past a completion.

mod config;
mod error;
mod feed_cache_store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use feed_cache_store::{
    DeletionCompletion, FeedCacheStore, FeedStore, InsertionCompletion, RetrievalCompletion,
    RetrieveResult,
};
