//! Provides a count constrained LRU Cache.
//!
//! An LRU cache drops the least recently used entry if it is about to grow beyond its capacity.
//! Both storing and reading an entry count as a "use", therefore the entries which are accessed
//! frequently remain in the cache while rarely used ones are evicted.
//!
//! The [LRUCache](LRUCache) itself is a plain data structure which requires a mutable reference
//! for every access (even reads update the recency order). A [SharedCache](SharedCache) wraps a
//! cache into a **Mutex** so that it can be used by many threads at once.
//!
//! The complete contents of a cache can be written to and restored from a JSON file, see
//! [LRUCache::save](LRUCache::save) and [LRUCache::load](LRUCache::load). The recency order is
//! preserved, so that a restored cache behaves exactly like the original one.
mod lru_cache;
mod persistence;
mod shared;

pub use lru_cache::LRUCache;
pub use persistence::{Item, Snapshot};
pub use shared::SharedCache;
