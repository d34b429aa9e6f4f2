//! Captures the contents of a cache and restores them from a file.
//!
//! The state of a cache is represented as [Snapshot](Snapshot): a list of all entries, ordered
//! from the most recently used to the least recently used one. Written as JSON, this looks like:
//!
//! ```json
//! {
//!   "items": [
//!     { "key": 1, "value": "item1" },
//!     { "key": 2, "value": "item2" }
//!   ]
//! }
//! ```
//!
//! Restoring a snapshot yields exactly the same recency order, therefore a restored cache will
//! evict its entries in the same order as the original one would have.
//!
//! Files are never written in place. The data is first written into a uniquely named temporary
//! file next to the destination, which is then renamed into its effective name. Therefore a
//! failed save leaves a previously written file intact. Loading is atomic as well: the whole
//! file is read and verified before the cache contents are replaced.
use std::collections::HashSet;
use std::hash::Hash;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::lru::LRUCache;

/// Contains all entries of a cache from the most recently used to the least recently used one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot<K, V> {
    /// The entries, most recently used first.
    pub items: Vec<Item<K, V>>,
}

/// Represents a single entry within a [Snapshot](Snapshot).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Item<K, V> {
    /// The key of the entry.
    pub key: K,
    /// The value stored for the key.
    pub value: V,
}

impl<K: Serialize, V: Serialize> Snapshot<K, V> {
    /// Renders the snapshot as (pretty printed) JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|error| CacheError::Format(error.to_string()))
            .context("Failed to encode the cache contents.")
    }
}

impl<K: DeserializeOwned, V: DeserializeOwned> Snapshot<K, V> {
    /// Parses a snapshot from the given JSON data.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::lru::Snapshot;
    /// let snapshot: Snapshot<i32, String> =
    ///     Snapshot::from_json(r#"{"items": [{"key": 1, "value": "one"}]}"#).unwrap();
    /// assert_eq!(snapshot.items[0].key, 1);
    ///
    /// assert_eq!(Snapshot::<i32, String>::from_json("[1, 2, 3]").is_err(), true);
    /// ```
    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        serde_json::from_str(data)
            .map_err(|error| CacheError::Format(error.to_string()))
            .context("Cannot parse the given cache data.")
    }
}

impl<K: Hash + Eq, V> LRUCache<K, V> {
    /// Captures the current contents of the cache.
    ///
    /// Note that this doesn't count as a "use" of any entry.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::lru::LRUCache;
    /// let mut lru = LRUCache::new(4).unwrap();
    /// lru.set(1, "one".to_owned());
    /// lru.set(2, "two".to_owned());
    ///
    /// let snapshot = lru.snapshot();
    /// assert_eq!(snapshot.items[0].key, 2);
    /// assert_eq!(snapshot.items[1].value, "one");
    /// ```
    pub fn snapshot(&self) -> Snapshot<K, V>
    where
        K: Clone,
        V: Clone,
    {
        Snapshot {
            items: self
                .iter()
                .map(|(key, value)| Item {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    /// Replaces the contents of the cache by the entries in the given snapshot.
    ///
    /// # Errors
    /// Fails if the snapshot contains more entries than the capacity of this cache or if a key
    /// is present more than once. In this case, the cache remains unchanged.
    pub fn restore(&mut self, snapshot: Snapshot<K, V>) -> anyhow::Result<()> {
        if snapshot.items.len() > self.capacity() {
            return Err(CacheError::Format(format!(
                "Cannot restore {} entries into a cache with a capacity of {}.",
                snapshot.items.len(),
                self.capacity()
            ))
            .into());
        }

        {
            let mut seen = HashSet::with_capacity(snapshot.items.len());
            if !snapshot.items.iter().all(|item| seen.insert(&item.key)) {
                return Err(CacheError::Format(
                    "The given data contains a key more than once.".to_owned(),
                )
                .into());
            }
        }

        self.replace_entries(
            snapshot
                .items
                .into_iter()
                .map(|item| (item.key, item.value))
                .collect(),
        );

        Ok(())
    }

    /// Writes the contents of the cache as JSON into the given file.
    ///
    /// The data is written into a temporary file first, which then replaces the given file.
    /// Therefore, if anything goes wrong, a file which was previously present remains intact.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::lru::LRUCache;
    /// # let dir = tempfile::tempdir().unwrap();
    /// # let file = dir.path().join("cache.json");
    /// let mut lru = LRUCache::new(2).unwrap();
    /// lru.set(1, "one".to_owned());
    /// lru.set(2, "two".to_owned());
    /// lru.save(&file).unwrap();
    ///
    /// let mut restored: LRUCache<i32, String> = LRUCache::new(2).unwrap();
    /// restored.load(&file).unwrap();
    /// assert_eq!(restored.get(&1).unwrap(), "one");
    /// assert_eq!(restored.get(&2).unwrap(), "two");
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        let path = path.as_ref();
        log::info!("Saving {} cache entries to {}...", self.len(), path.display());

        let snapshot = Snapshot {
            items: self
                .iter()
                .map(|(key, value)| Item { key, value })
                .collect(),
        };

        write_atomically(path, &snapshot)
            .with_context(|| format!("Failed to save the cache to {}.", path.display()))
    }

    /// Replaces the contents of the cache by the entries stored in the given file.
    ///
    /// # Errors
    /// Fails if the file cannot be read, isn't valid JSON, doesn't fit into this cache or
    /// contains a key more than once. In this case, the cache remains unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let path = path.as_ref();
        log::info!("Loading cache entries from {}...", path.display());

        let data = std::fs::read_to_string(path)
            .map_err(|error| CacheError::io(path, error))
            .with_context(|| format!("Failed to read {}.", path.display()))?;

        Snapshot::<K, V>::from_json(&data)
            .and_then(|snapshot| self.restore(snapshot))
            .with_context(|| format!("Failed to load the cache from {}.", path.display()))?;

        log::info!(
            "Loaded {} cache entries from {}.",
            self.len(),
            path.display()
        );

        Ok(())
    }
}

/// Determines the directory in which the temporary file for the given file is created.
///
/// This has to be the directory of the file itself, as a rename cannot cross file systems.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn write_atomically<T: Serialize>(path: &Path, data: &T) -> anyhow::Result<()> {
    let directory = parent_dir(path);

    // Each save uses its own uniquely named temporary file, which is removed once it is
    // dropped without having been persisted...
    let mut tmp_file = NamedTempFile::new_in(directory)
        .map_err(|error| CacheError::io(directory, error))
        .context("Failed to create a temporary file.")?;

    write_file(&mut tmp_file, data)?;

    let _ = tmp_file
        .persist(path)
        .map_err(|error| CacheError::io(path, error.error))
        .context("Failed to rename file to its effective name.")?;

    Ok(())
}

fn write_file<T: Serialize>(tmp_file: &mut NamedTempFile, data: &T) -> anyhow::Result<()> {
    let tmp_path = tmp_file.path().to_path_buf();

    {
        let mut writer = BufWriter::new(tmp_file.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, data).map_err(|error| {
            if error.is_io() {
                CacheError::io(&tmp_path, error.into())
            } else {
                CacheError::Format(error.to_string())
            }
        })?;

        writer
            .flush()
            .map_err(|error| CacheError::io(&tmp_path, error))
            .context("Failed to flush data to disk.")?;
    }

    tmp_file
        .as_file()
        .sync_all()
        .map_err(|error| CacheError::io(&tmp_path, error))
        .context("Failed to flush data to disk.")?;

    Ok(())
}
