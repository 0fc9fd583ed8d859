//! Record shapes and SQLite primitives behind the cache store.
//!
//! # Responsibility
//! - Map transfer values to persisted rows and back.
//! - Keep SQL details out of the store's scheduling code.
//!
//! # Invariants
//! - Primitives never open or commit transactions themselves; callers own
//!   the unit of work.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod cache_repo;
