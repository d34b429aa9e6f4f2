use std::borrow::Borrow;
use std::hash::Hash;

use linked_hash_map::LinkedHashMap;

use crate::error::CacheError;

/// Provides a count constrained LRU cache.
///
/// A cache behaves just like a **Map** as long as there are fewer entries than its capacity.
/// Once it is full, storing a new key evicts the least recently used entry - hence the name
/// LRU cache. Both reading (**get**) and writing (**set**) count as a "use".
///
/// Internally the recency order is kept by a **LinkedHashMap**, which combines a hash index
/// with a doubly linked list. The back of that list is the most recently used entry, the front
/// is the next one to be evicted. Therefore lookups, updates and evictions all run in constant
/// time.
///
/// Note that this struct requires a mutable reference even to read, as each read updates the
/// recency order. Use a [SharedCache](crate::lru::SharedCache) to access a cache from several
/// threads.
///
/// # Examples
/// ```
/// # use lru_store::lru::LRUCache;
/// let mut lru = LRUCache::new(2).unwrap();
///
/// lru.set(1, "item1");
/// lru.set(2, "item2");
/// assert_eq!(lru.get(&1), Some(&"item1"));
///
/// // As "1" has just been used, "2" is the least recently used entry and is evicted...
/// lru.set(3, "item3");
/// assert_eq!(lru.get(&2), None);
/// assert_eq!(lru.get(&1), Some(&"item1"));
///```
pub struct LRUCache<K, V> {
    capacity: usize,
    reads: usize,
    hits: usize,
    writes: usize,
    evictions: usize,
    map: LinkedHashMap<K, V>,
}

impl<K: Hash + Eq, V> LRUCache<K, V> {
    /// Creates a new cache which can store up to **capacity** entries.
    ///
    /// # Errors
    /// Fails with [CacheError::InvalidCapacity] if the given capacity is zero, as such a cache
    /// could never hold a single entry.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::lru::LRUCache;
    /// let lru: LRUCache<i32, String> = LRUCache::new(128).unwrap();
    /// assert_eq!(lru.capacity(), 128);
    ///
    /// assert_eq!(LRUCache::<i32, String>::new(0).is_err(), true);
    ///```
    pub fn new(capacity: usize) -> anyhow::Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity.into());
        }

        Ok(LRUCache {
            capacity,
            reads: 0,
            hits: 0,
            writes: 0,
            evictions: 0,
            // The map grows on demand, as the capacity might be way larger than the actual
            // number of entries...
            map: LinkedHashMap::new(),
        })
    }

    /// Stores the given value for the given key.
    ///
    /// If the key is already present, its value is replaced and the entry becomes the most
    /// recently used one. Otherwise the entry is added and, if the cache is full, the least
    /// recently used entry is evicted first. This evicted entry is returned.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::lru::LRUCache;
    /// let mut lru = LRUCache::new(1).unwrap();
    ///
    /// assert_eq!(lru.set("Foo", 1), None);
    /// // Replacing a value never evicts anything...
    /// assert_eq!(lru.set("Foo", 2), None);
    /// // ..but a new key has to make room.
    /// assert_eq!(lru.set("Bar", 3), Some(("Foo", 2)));
    ///```
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.writes += 1;

        if let Some(entry) = self.map.get_refresh(&key) {
            *entry = value;
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let _ = self.map.insert(key, value);

        evicted
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let lru_entry = self.map.pop_front();
        if lru_entry.is_some() {
            self.evictions += 1;
            log::trace!(
                "Evicted the least recently used entry ({} entries remain).",
                self.map.len()
            );
        }

        lru_entry
    }

    /// Returns the value which has previously been stored for the given key or **None** if
    /// no value is present.
    ///
    /// A successful lookup marks the entry as most recently used. A miss doesn't change the
    /// order of the cache at all.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::lru::LRUCache;
    /// let mut lru = LRUCache::new(8).unwrap();
    ///
    /// // After inserting a value...
    /// lru.set("Foo".to_owned(), "Bar".to_owned());
    /// // ..it can be retrieved.
    /// assert_eq!(lru.get("Foo").unwrap(), "Bar");
    /// assert_eq!(lru.get("Unknown"), None);
    ///```
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.reads += 1;

        match self.map.get_refresh(key) {
            Some(value) => {
                self.hits += 1;
                Some(&*value)
            }
            None => None,
        }
    }

    /// Returns the value stored for the given key without marking it as used.
    ///
    /// This neither affects the eviction order nor the read metrics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key)
    }

    /// Determines if a value is present for the given key without marking it as used.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Iterates over all entries from the most recently used to the least recently used one.
    ///
    /// Iterating doesn't count as a "use" of the entries.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::lru::LRUCache;
    /// let mut lru = LRUCache::new(4).unwrap();
    /// lru.set(1, "A");
    /// lru.set(2, "B");
    /// lru.set(3, "C");
    /// let _ = lru.get(&1);
    ///
    /// let keys: Vec<i32> = lru.iter().map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec![1, 3, 2]);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter().rev()
    }

    /// Removes all entries in this cache.
    ///
    /// Note that this will also zero all metrics (reads, writes, hits, evictions).
    pub fn flush(&mut self) {
        self.map.clear();
        self.reads = 0;
        self.hits = 0;
        self.writes = 0;
        self.evictions = 0;
    }

    /// Replaces all entries by the given ones without touching the metrics.
    ///
    /// The entries have to be given from the most recently used to the least recently used one
    /// and must neither exceed the capacity nor contain duplicate keys. This is ensured by
    /// the caller.
    pub(crate) fn replace_entries(&mut self, entries: Vec<(K, V)>) {
        self.map.clear();

        // The map keeps its most recently used entry at the back, therefore we start with
        // the least recently used one...
        for (key, value) in entries.into_iter().rev() {
            let _ = self.map.insert(key, value);
        }
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Determines if the cache is completely empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the overall capacity (max number of entries) of this cache.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the cache utilization in percent.
    pub fn utilization(&self) -> f32 {
        self.map.len() as f32 / self.capacity as f32 * 100.
    }

    /// Returns the cache hit rate in percent.
    ///
    /// Note that all metrics are reset when **flush()** is called.
    pub fn hit_rate(&self) -> f32 {
        match self.reads {
            0 => 0.,
            n => self.hits as f32 / n as f32 * 100.,
        }
    }

    /// Returns the total number of reads performed on this cache since the last flush.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Returns the number of reads which found a value since the last flush.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Returns the total number of writes performed on this cache since the last flush.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Returns the number of entries which were evicted to make room since the last flush.
    pub fn evictions(&self) -> usize {
        self.evictions
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CacheError;
    use crate::lru::LRUCache;

    fn keys(lru: &LRUCache<i32, String>) -> Vec<i32> {
        lru.iter().map(|(key, _)| *key).collect()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let error = LRUCache::<i32, String>::new(0).err().unwrap();
        assert!(matches!(
            error.downcast_ref::<CacheError>(),
            Some(CacheError::InvalidCapacity)
        ));
    }

    #[test]
    fn huge_capacities_do_not_allocate_upfront() {
        let mut lru = LRUCache::new(usize::MAX).unwrap();
        assert_eq!(lru.capacity(), usize::MAX);

        let _ = lru.set(1, "A".to_owned());
        assert_eq!(lru.get(&1).unwrap(), "A");
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn example_scenario_works() {
        let mut lru = LRUCache::new(2).unwrap();

        lru.set(1, "item1".to_owned());
        lru.set(2, "item2".to_owned());
        assert_eq!(lru.get(&1).unwrap(), "item1");

        // "1" was just used, so "2" has to go...
        assert_eq!(lru.set(3, "item3".to_owned()), Some((2, "item2".to_owned())));
        assert_eq!(lru.get(&2), None);
        assert_eq!(lru.get(&1).unwrap(), "item1");
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn capacity_is_enforced() {
        // Creates a cache, which permits four entries at the same time...
        let mut lru = LRUCache::new(4).unwrap();

        // We expect 4 entries to fully fit in the cache....
        for i in 0..4 {
            assert_eq!(lru.set(i, format!("World{}", i)), None);
        }
        assert_eq!(lru.len(), 4);
        for i in 0..4 {
            assert_eq!(lru.get(&i).unwrap(), &format!("World{}", i));
        }

        // Now if another entry is added, the LRU (least recently used/inserted)
        // will be dropped...
        let _ = lru.set(4, "World4".to_owned());
        assert_eq!(lru.len(), 4);
        assert_eq!(lru.get(&0), None);
        for i in 1..5 {
            assert_eq!(lru.get(&i).unwrap(), &format!("World{}", i));
        }

        // Now if we "use" another entry, it gets "saved" and another one will
        // be evicted upon an insertion...
        let _ = lru.get(&1);
        let _ = lru.set(5, "World5".to_owned());
        assert_eq!(lru.get(&1).unwrap(), "World1");
        assert_eq!(lru.get(&2), None);
        assert_eq!(lru.get(&3).unwrap(), "World3");
        assert_eq!(lru.get(&4).unwrap(), "World4");
        assert_eq!(lru.get(&5).unwrap(), "World5");
        assert_eq!(lru.evictions(), 2);
    }

    #[test]
    fn get_promotes_an_entry() {
        let mut lru = LRUCache::new(2).unwrap();
        let _ = lru.set(1, "A".to_owned());
        let _ = lru.set(2, "B".to_owned());
        let _ = lru.get(&1);
        let _ = lru.set(3, "C".to_owned());

        assert_eq!(lru.contains(&1), true);
        assert_eq!(lru.contains(&2), false);
        assert_eq!(lru.contains(&3), true);
    }

    #[test]
    fn updating_a_key_promotes_it_without_growing() {
        let mut lru = LRUCache::new(3).unwrap();
        let _ = lru.set(1, "A".to_owned());
        let _ = lru.set(2, "B".to_owned());
        let _ = lru.set(3, "C".to_owned());
        assert_eq!(keys(&lru), vec![3, 2, 1]);

        assert_eq!(lru.set(1, "A1".to_owned()), None);
        assert_eq!(lru.len(), 3);
        assert_eq!(keys(&lru), vec![1, 3, 2]);

        // "2" is now the least recently used entry...
        assert_eq!(lru.set(4, "D".to_owned()), Some((2, "B".to_owned())));
        assert_eq!(lru.peek(&1).unwrap(), "A1");
    }

    #[test]
    fn misses_and_peeks_do_not_touch_the_order() {
        let mut lru = LRUCache::new(2).unwrap();
        let _ = lru.set(1, "A".to_owned());
        let _ = lru.set(2, "B".to_owned());

        assert_eq!(lru.get(&3), None);
        assert_eq!(lru.peek(&1).unwrap(), "A");
        assert_eq!(keys(&lru), vec![2, 1]);

        // As peek didn't count as a use, "1" is evicted...
        let _ = lru.set(3, "C".to_owned());
        assert_eq!(lru.peek(&1), None);
    }

    #[test]
    fn last_set_value_wins() {
        let mut lru = LRUCache::new(16).unwrap();
        for round in 0..3 {
            for i in 0..16 {
                let _ = lru.set(i, format!("{}-{}", i, round));
            }
        }

        assert_eq!(lru.len(), 16);
        for i in 0..16 {
            assert_eq!(lru.get(&i).unwrap(), &format!("{}-2", i));
        }
    }

    #[test]
    fn metrics_are_computed_correctly() {
        let mut lru = LRUCache::new(4).unwrap();

        // Write 3 values into the cache...
        let _ = lru.set("A", 1);
        let _ = lru.set("B", 2);
        let _ = lru.set("C", 3);

        // Perform 4 reads, of which 3 hit a cache entry...
        assert_eq!(lru.get("A").is_some(), true);
        assert_eq!(lru.get("B").is_some(), true);
        assert_eq!(lru.get("C").is_some(), true);
        assert_eq!(lru.get("D").is_none(), true);

        // ... therefore we had 3 writes, 4 reads of which 3 hit a value which
        // yields a hit rate of 75%
        assert_eq!(lru.writes(), 3);
        assert_eq!(lru.reads(), 4);
        assert_eq!(lru.hits(), 3);
        assert_eq!(lru.hit_rate().round() as i32, 75);

        // The cache contains 3 entries and has a capacity of 4 -> 75% utilization...
        assert_eq!(lru.utilization().round() as i32, 75);

        lru.flush();
        assert_eq!(lru.is_empty(), true);
        assert_eq!(lru.reads(), 0);
        assert_eq!(lru.writes(), 0);
        assert_eq!(lru.hit_rate(), 0.);
    }

    #[test]
    fn replacing_entries_keeps_the_given_order() {
        let mut lru = LRUCache::new(3).unwrap();
        let _ = lru.set(9, "X".to_owned());

        lru.replace_entries(vec![
            (1, "A".to_owned()),
            (2, "B".to_owned()),
            (3, "C".to_owned()),
        ]);
        assert_eq!(keys(&lru), vec![1, 2, 3]);

        // The last given entry is the least recently used one...
        assert_eq!(lru.set(4, "D".to_owned()), Some((3, "C".to_owned())));
    }
}
