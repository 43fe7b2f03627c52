//! # lrucache
//!
//! Fixed-capacity, in-memory least-recently-used cache.
//!
//! ## Architecture
//! - **Recency index**: AHash `HashMap` from key to arena slot (O(1) lookup)
//! - **Recency order**: index-linked doubly-linked list over a slot arena,
//!   most recently used at the head (O(1) promotion and tail eviction)
//! - **Expiry**: optional maximum age, checked lazily on access
//! - **Sharing**: [`SharedLruCache`] puts one cache behind a single mutex
//!
//! Neither a miss nor an eviction is an error: misses come back as
//! [`Error::NotFound`], evictions as the displaced entry returned from
//! [`LruCache::set`].

#![warn(missing_docs)]

mod config;
mod error;
mod lru;
mod order;
mod shared;
mod stats;

pub use config::CacheConfig;
pub use error::{Error, Result};
pub use lru::LruCache;
pub use shared::SharedLruCache;
pub use stats::{CacheStats, StatsSnapshot};
