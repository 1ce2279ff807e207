//! Exact LRU Module
//!
//! Sharded maps plus one global recency list. Eviction always removes the
//! true least recently used entry, at the price of a global lock on every
//! recency update.
//!
//! # Lock order
//! The recency lock may be held while taking a shard lock (new-key insert,
//! eviction, clear). A shard lock is never held while taking the recency
//! lock: every path that needs both releases the shard first.
//!
//! New mappings are published while the recency lock is held, so the shards
//! never hold more entries than the list, and the list never exceeds
//! capacity.

use std::hash::Hash;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::cache::recency::{NodeHandle, RecencyList};
use crate::cache::shard::{Shard, ShardSet};
use crate::cache::stats::StatsRecorder;
use crate::cache::{validate_dimensions, CacheStats, ConcurrentCache};
use crate::error::Result;

// == Exact Slot ==
/// Shard-side half of an entry: the value and its node in the recency list.
struct ExactSlot<V> {
    value: V,
    handle: NodeHandle,
}

// == Exact LRU ==
/// Concurrent cache with exact least-recently-used eviction.
pub struct ExactLru<K, V> {
    shards: ShardSet<K, ExactSlot<V>>,
    /// Global recency order, most recent first.
    recency: Mutex<RecencyList<K>>,
    capacity: usize,
    stats: StatsRecorder,
}

impl<K, V> ExactLru<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries spread over
    /// `shard_count` shards.
    ///
    /// Fails if either value is zero or there are more shards than entries.
    pub fn new(capacity: usize, shard_count: usize) -> Result<Self> {
        validate_dimensions(capacity, shard_count)?;
        debug!(capacity, shard_count, "Exact LRU cache created");

        Ok(Self {
            shards: ShardSet::new(shard_count)?,
            recency: Mutex::new(RecencyList::with_capacity(capacity)),
            capacity,
            stats: StatsRecorder::new(),
        })
    }

    // == Put ==
    /// Inserts or replaces a value.
    ///
    /// Replacing refreshes recency and never evicts. Inserting a new key
    /// evicts the least recently used entry first when the cache is full.
    pub fn put(&self, key: K, value: V) {
        let idx = self.shards.index_for(&key);
        let shard = self.shards.shard(idx);

        // Existing key: update in place, then refresh recency.
        let value = match Self::replace_existing(shard, &key, value) {
            Ok(handle) => {
                self.recency.lock().touch(handle);
                self.stats.record_update();
                return;
            }
            Err(value) => value,
        };

        // New key. Mappings are only ever added under the recency lock, so a
        // node and its mapping appear and disappear together.
        let mut recency = self.recency.lock();
        let value = match Self::replace_existing(shard, &key, value) {
            Ok(handle) => {
                // Published by another put since the first lookup.
                recency.touch(handle);
                self.stats.record_update();
                return;
            }
            Err(value) => value,
        };

        if recency.len() >= self.capacity {
            self.evict_lru(&mut recency);
        }
        let handle = recency.push_front(key.clone(), idx);
        shard.write().insert(key, ExactSlot { value, handle });
        self.stats.record_insert();
    }

    /// Overwrites the value if `key` is already mapped and returns its node.
    /// Hands `value` back untouched on a miss.
    fn replace_existing(
        shard: &Shard<K, ExactSlot<V>>,
        key: &K,
        value: V,
    ) -> std::result::Result<NodeHandle, V> {
        let mut map = shard.write();
        let outcome = match map.get_mut(key) {
            Some(slot) => {
                slot.value = value;
                Ok(slot.handle)
            }
            None => Err(value),
        };
        outcome
    }

    // == Get ==
    /// Returns a copy of the value and moves the entry to the front of the
    /// recency list.
    pub fn get(&self, key: &K) -> Option<V> {
        let idx = self.shards.index_for(key);
        let found = {
            let map = self.shards.shard(idx).read();
            map.get(key).map(|slot| (slot.value.clone(), slot.handle))
        };

        match found {
            Some((value, handle)) => {
                self.recency.lock().touch(handle);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Contains ==
    /// Checks presence without refreshing recency.
    pub fn contains(&self, key: &K) -> bool {
        let idx = self.shards.index_for(key);
        self.shards.shard(idx).read().contains_key(key)
    }

    // == Size ==
    pub fn size(&self) -> usize {
        self.recency.lock().len()
    }

    // == Clear ==
    /// Empties every shard and the recency list.
    ///
    /// Takes the recency lock first and then every shard in index order, the
    /// same order eviction uses, and holds them all so no insert can land
    /// between the two halves.
    pub fn clear(&self) {
        let mut recency = self.recency.lock();
        let mut guards = self.shards.lock_all();

        let mut removed = 0;
        for map in guards.iter_mut() {
            removed += map.len();
            map.clear();
        }
        recency.clear();

        drop(guards);
        drop(recency);
        info!(removed, "Exact LRU cache cleared");
    }

    // == Evict LRU ==
    /// Removes the tail of the recency list. Caller holds the recency lock.
    fn evict_lru(&self, recency: &mut RecencyList<K>) {
        let Some((handle, key, shard_idx)) = recency.peek_oldest() else {
            return;
        };
        let key = key.clone();

        // Only erase the mapping that belongs to this node.
        let erased = {
            let mut map = self.shards.shard(shard_idx).write();
            match map.get(&key) {
                Some(slot) if slot.handle == handle => {
                    map.remove(&key);
                    true
                }
                _ => false,
            }
        };

        // Re-inspect the tail before popping.
        let popped = recency
            .peek_oldest()
            .is_some_and(|(tail, _, _)| tail == handle)
            && recency.remove(handle).is_some();

        if erased && popped {
            self.stats.record_eviction();
            trace!(shard = shard_idx, "Evicted least recently used entry");
        } else {
            self.stats.record_eviction_race();
            trace!(shard = shard_idx, erased, popped, "Eviction found list and shard out of step");
        }
    }

    /// Total mappings across shards; equals `size()` when the cache is idle.
    #[cfg(test)]
    fn mapped_entries(&self) -> usize {
        self.shards.entry_count()
    }
}

impl<K, V> ConcurrentCache<K, V> for ExactLru<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) {
        ExactLru::put(self, key, value)
    }

    fn get(&self, key: &K) -> Option<V> {
        ExactLru::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        ExactLru::contains(self, key)
    }

    fn size(&self) -> usize {
        ExactLru::size(self)
    }

    fn clear(&self) {
        ExactLru::clear(self)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.size())
    }
}
