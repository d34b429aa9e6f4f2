//! Provides a thread safe wrapper around an [LRUCache](crate::lru::LRUCache).
//!
//! As even a read updates the recency order of a cache, a shared (read) lock wouldn't be
//! sufficient. Therefore a [SharedCache](SharedCache) guards its cache by a single **Mutex**
//! which is acquired by every operation. This also covers **save** and **load**, which hold the
//! lock for their whole duration, so that concurrent readers and writers either see the state
//! before or after the file operation, but never anything in between.
//!
//! # Examples
//! ```
//! # use std::sync::Arc;
//! # use lru_store::lru::SharedCache;
//! let cache = Arc::new(SharedCache::new(128).unwrap());
//!
//! let threads: Vec<_> = (0..4)
//!     .map(|id| {
//!         let cache = cache.clone();
//!         std::thread::spawn(move || {
//!             cache.set(id, id * 100);
//!         })
//!     })
//!     .collect();
//!
//! for thread in threads {
//!     thread.join().unwrap();
//! }
//!
//! assert_eq!(cache.len(), 4);
//! assert_eq!(cache.get(&3), Some(300));
//! ```
use std::borrow::Borrow;
use std::hash::Hash;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CacheError;
use crate::lru::{LRUCache, Snapshot};
use crate::settings::Settings;

/// Wraps an [LRUCache](LRUCache) so that it can be shared among threads (e.g. via an **Arc**).
///
/// Note that values are cloned when being read, as a reference cannot outlive the lock. To
/// share large values without copying them, store them as **Arc<T>**. Alternatively use
/// [get_with](SharedCache::get_with) to inspect a value while the lock is held.
pub struct SharedCache<K, V> {
    cache: Mutex<LRUCache<K, V>>,
}

impl<K: Hash + Eq, V> SharedCache<K, V> {
    /// Creates a new cache which can store up to **capacity** entries.
    ///
    /// # Errors
    /// Fails if the given capacity is zero.
    pub fn new(capacity: usize) -> anyhow::Result<Self> {
        Ok(SharedCache {
            cache: Mutex::new(LRUCache::new(capacity)?),
        })
    }

    /// Creates a cache as described by the given settings.
    ///
    /// If the settings specify a persistence file, the cache contents are loaded from it. Only
    /// if the file doesn't exist (yet), an empty cache is created.
    ///
    /// # Errors
    /// Fails if the capacity is invalid or if an existing persistence file cannot be read or
    /// parsed.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let cache = SharedCache::new(settings.capacity())?;

        if let Some(file) = settings.file() {
            if let Err(error) = cache.load(file) {
                if !is_missing_file(&error) {
                    return Err(error);
                }

                log::info!(
                    "Cache file {} doesn't exist yet - starting with an empty cache.",
                    file.display()
                );
            }
        }

        Ok(cache)
    }

    fn lock(&self) -> MutexGuard<'_, LRUCache<K, V>> {
        // A panicking caller (e.g. within Hash or Eq of a key) cannot leave the linked map in
        // an inconsistent state, therefore we keep on using the cache.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the value stored for the given key and marks the entry as used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.lock().get(key).cloned()
    }

    /// Applies the given function on the value stored for the given key and marks the entry as
    /// used.
    ///
    /// Note that the cache remains locked while the function runs.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::lru::SharedCache;
    /// let cache = SharedCache::new(8).unwrap();
    /// cache.set("Foo", vec![1, 2, 3]);
    ///
    /// assert_eq!(cache.get_with("Foo", |value| value.len()), Some(3));
    /// assert_eq!(cache.get_with("Bar", |value| value.len()), None);
    /// ```
    pub fn get_with<Q, R>(&self, key: &Q, f: impl FnOnce(&V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().get(key).map(f)
    }

    /// Stores the given value for the given key and returns the evicted entry if any.
    ///
    /// See [LRUCache::set](LRUCache::set).
    pub fn set(&self, key: K, value: V) -> Option<(K, V)> {
        self.lock().set(key, value)
    }

    /// Determines if a value is present for the given key without marking it as used.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().contains(key)
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Determines if the cache is completely empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the overall capacity (max number of entries) of this cache.
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Removes all entries and resets all metrics.
    pub fn flush(&self) {
        self.lock().flush();
    }

    /// Returns the cache hit rate in percent.
    pub fn hit_rate(&self) -> f32 {
        self.lock().hit_rate()
    }

    /// Returns the cache utilization in percent.
    pub fn utilization(&self) -> f32 {
        self.lock().utilization()
    }

    /// Returns the number of entries which were evicted since the last flush.
    pub fn evictions(&self) -> usize {
        self.lock().evictions()
    }

    /// Captures the current contents of the cache.
    pub fn snapshot(&self) -> Snapshot<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.lock().snapshot()
    }

    /// Writes the contents of the cache into the given file.
    ///
    /// See [LRUCache::save](LRUCache::save).
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        self.lock().save(path)
    }

    /// Writes the contents of the cache into the file given in the settings.
    ///
    /// If no file is specified in the settings, nothing happens.
    pub fn save_configured(&self, settings: &Settings) -> anyhow::Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        match settings.file() {
            Some(file) => self.save(file),
            None => {
                log::debug!("No cache file is configured - skipping save.");
                Ok(())
            }
        }
    }

    /// Replaces the contents of the cache by the entries stored in the given file.
    ///
    /// See [LRUCache::load](LRUCache::load).
    pub fn load(&self, path: impl AsRef<Path>) -> anyhow::Result<()>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        self.lock().load(path)
    }

    /// Unwraps the underlying cache.
    pub fn into_inner(self) -> LRUCache<K, V> {
        self.cache
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Determines if loading failed only because the file is absent.
fn is_missing_file(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<CacheError>(),
        Some(CacheError::Io { source, .. }) if source.kind() == ErrorKind::NotFound
    )
}
