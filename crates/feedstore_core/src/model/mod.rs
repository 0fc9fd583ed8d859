//! Transfer values exchanged at the store boundary.
//!
//! # Responsibility
//! - Define persistence-agnostic shapes passed in and out of the cache store.
//!
//! # Invariants
//! - Transfer values never carry persistence identity (row ids, positions).

pub mod feed_item;
