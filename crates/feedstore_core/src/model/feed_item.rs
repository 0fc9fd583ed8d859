//! Feed item transfer value.
//!
//! # Responsibility
//! - Describe one image entry of a cached feed.
//!
//! # Invariants
//! - `id` is stable for the item and is stored verbatim.
//! - `url` is always an absolute URL; optional text fields stay `None` when
//!   absent rather than collapsing to empty strings.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Stable identifier of a feed image.
pub type FeedItemId = Uuid;

/// Plain feed image metadata handed to and returned by the cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFeedItem {
    pub id: FeedItemId,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Url,
}

impl LocalFeedItem {
    pub fn new(
        id: FeedItemId,
        description: Option<String>,
        location: Option<String>,
        url: Url,
    ) -> Self {
        Self {
            id,
            description,
            location,
            url,
        }
    }
}
