//! lru-store provides a fixed capacity in-memory key-value cache with LRU eviction.
//!
//! # Introduction
//! The cache stores up to **capacity** entries. Once it is full, storing another key evicts the
//! least recently used entry. Reading an entry counts as a use, so frequently accessed entries
//! remain in the cache. All operations run in constant time, as the cache combines a hash index
//! with a doubly linked recency list.
//!
//! # Features
//! * **Generic keys and values**: any hashable key and any value type can be stored.
//! * **Thread safety**: a [SharedCache](lru::SharedCache) can be used from many threads at once.
//! * **Persistence**: the complete contents can be saved to and loaded from a JSON file. Files
//!   are replaced atomically and a failed load never damages the current contents.
//! * **Settings**: caches can be described in a small YAML document, see [settings].
//!
//! # Examples
//! ```
//! # use lru_store::lru::LRUCache;
//! let mut lru = LRUCache::new(2).unwrap();
//!
//! lru.set(1, "item1");
//! lru.set(2, "item2");
//! assert_eq!(lru.get(&1), Some(&"item1"));
//!
//! // "2" is the least recently used entry and therefore has to make room...
//! lru.set(3, "item3");
//! assert_eq!(lru.get(&2), None);
//! assert_eq!(lru.get(&1), Some(&"item1"));
//! ```
#![deny(
    warnings,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]
use simplelog::{format_description, ConfigBuilder, LevelFilter, SimpleLogger};
use std::sync::Once;

pub mod error;
pub mod lru;
pub mod settings;

/// Initializes the logging system.
///
/// Note that the library itself never does this, as this is the duty of the application
/// which uses it.
pub fn init_logging() {
    static INIT_LOGGING: Once = Once::new();

    // Tests might call this several times...
    INIT_LOGGING.call_once(|| {
        if let Err(error) = SimpleLogger::init(
            LevelFilter::Debug,
            ConfigBuilder::new()
                .set_time_format_custom(format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]"
                ))
                .set_thread_level(LevelFilter::Trace)
                .set_target_level(LevelFilter::Error)
                .set_location_level(LevelFilter::Trace)
                .build(),
        ) {
            panic!("Failed to initialize logging system: {}", error);
        }
    });
}
