#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use feedstore_core::{FeedStore, LocalFeedItem, RetrieveResult, StoreResult};
use std::sync::mpsc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(10);

pub fn item(label: &str) -> LocalFeedItem {
    LocalFeedItem::new(
        Uuid::new_v4(),
        Some(format!("{label} description")),
        Some(format!("{label} location")),
        Url::parse(&format!("https://images.example.com/{label}.jpg")).unwrap(),
    )
}

pub fn bare_item(label: &str) -> LocalFeedItem {
    LocalFeedItem::new(
        Uuid::new_v4(),
        None,
        None,
        Url::parse(&format!("https://images.example.com/{label}.jpg")).unwrap(),
    )
}

pub fn timestamp(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 30, 15).unwrap()
}

pub fn retrieve(store: &dyn FeedStore) -> RetrieveResult {
    let (tx, rx) = mpsc::channel();
    store.retrieve(Box::new(move |result| {
        let _ = tx.send(result);
    }));
    rx.recv_timeout(COMPLETION_TIMEOUT).unwrap()
}

pub fn insert(
    store: &dyn FeedStore,
    items: Vec<LocalFeedItem>,
    timestamp: DateTime<Utc>,
) -> StoreResult<()> {
    let (tx, rx) = mpsc::channel();
    store.insert(
        items,
        timestamp,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    rx.recv_timeout(COMPLETION_TIMEOUT).unwrap()
}

pub fn delete(store: &dyn FeedStore) -> StoreResult<()> {
    let (tx, rx) = mpsc::channel();
    store.delete(Box::new(move |result| {
        let _ = tx.send(result);
    }));
    rx.recv_timeout(COMPLETION_TIMEOUT).unwrap()
}

pub fn expect_found(result: RetrieveResult) -> (Vec<LocalFeedItem>, DateTime<Utc>) {
    match result {
        RetrieveResult::Found { items, timestamp } => (items, timestamp),
        RetrieveResult::Empty => panic!("expected cached feed, got empty"),
        RetrieveResult::Failure(err) => panic!("expected cached feed, got failure: {err}"),
    }
}

pub fn assert_empty(result: RetrieveResult) {
    match result {
        RetrieveResult::Empty => {}
        RetrieveResult::Found { items, .. } => {
            panic!("expected empty cache, found {} items", items.len())
        }
        RetrieveResult::Failure(err) => panic!("expected empty cache, got failure: {err}"),
    }
}
