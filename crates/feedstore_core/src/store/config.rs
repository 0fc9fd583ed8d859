//! Store construction options.

use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_WORKER_NAME: &str = "feedstore-worker";

/// Options applied when opening a [`FeedCacheStore`](super::FeedCacheStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long SQLite waits on a locked database before failing the job.
    pub busy_timeout: Duration,
    /// Thread name of the store's private worker.
    pub worker_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}
