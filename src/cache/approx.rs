//! Approximate LRU Module
//!
//! Each entry carries its own last-access timestamp inside its shard, so
//! reads and writes never touch a global lock. Eviction scans every shard
//! for the oldest timestamp.
//!
//! # Weaker guarantees
//! - `get` refreshes the timestamp while holding only the shard's shared
//!   lock. Concurrent readers and an in-progress eviction scan race on that
//!   field; the scan may see a value that is about to be refreshed. Values
//!   are never affected, only which entry gets evicted.
//! - Timestamps have millisecond resolution, so entries touched within the
//!   same millisecond are indistinguishable to eviction.
//! - The victim is the oldest entry at the moment its shard was scanned. It
//!   is skipped if it was refreshed after the scan.

use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::cache::shard::ShardSet;
use crate::cache::stats::StatsRecorder;
use crate::cache::{validate_dimensions, CacheStats, Clock, ConcurrentCache, MonotonicClock};
use crate::error::Result;

// == Stamped Entry ==
/// A value plus the millisecond it was last written or read.
struct StampedEntry<V> {
    value: V,
    last_touched: AtomicU64,
}

impl<V> StampedEntry<V> {
    fn new(value: V, now: u64) -> Self {
        Self {
            value,
            last_touched: AtomicU64::new(now),
        }
    }

    #[inline]
    fn stamp(&self) -> u64 {
        self.last_touched.load(Ordering::Relaxed)
    }

    /// Refreshes the timestamp through a shared reference.
    ///
    /// `fetch_max` keeps a slow reader from moving the stamp backwards.
    #[inline]
    fn touch(&self, now: u64) {
        self.last_touched.fetch_max(now, Ordering::Relaxed);
    }
}

/// Eviction candidate found by a scan.
struct Victim<K> {
    key: K,
    shard: usize,
    stamp: u64,
}

// == Approximate LRU ==
/// Concurrent cache with timestamp-approximated LRU eviction.
pub struct ApproxLru<K, V> {
    shards: ShardSet<K, StampedEntry<V>>,
    /// Live entries plus slots reserved by inserts in flight.
    live: AtomicUsize,
    capacity: usize,
    clock: Arc<dyn Clock>,
    stats: StatsRecorder,
}

impl<K, V> ApproxLru<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    // == Constructor ==
    /// Creates an empty cache timed by a [`MonotonicClock`].
    pub fn new(capacity: usize, shard_count: usize) -> Result<Self> {
        Self::with_clock(capacity, shard_count, Arc::new(MonotonicClock::new()))
    }

    /// Creates an empty cache timed by `clock`.
    pub fn with_clock(capacity: usize, shard_count: usize, clock: Arc<dyn Clock>) -> Result<Self> {
        validate_dimensions(capacity, shard_count)?;
        debug!(capacity, shard_count, "Approximate LRU cache created");

        Ok(Self {
            shards: ShardSet::new(shard_count)?,
            live: AtomicUsize::new(0),
            capacity,
            clock,
            stats: StatsRecorder::new(),
        })
    }

    // == Put ==
    /// Inserts or replaces a value, stamping it with the current time.
    pub fn put(&self, key: K, value: V) {
        let idx = self.shards.index_for(&key);
        let shard = self.shards.shard(idx);

        {
            let mut map = shard.write();
            if let Some(entry) = map.get_mut(&key) {
                entry.value = value;
                *entry.last_touched.get_mut() = self.clock.now_ms();
                self.stats.record_update();
                return;
            }
        }

        self.reserve_slot();

        let raced = {
            let mut map = shard.write();
            let now = self.clock.now_ms();
            match map.entry(key) {
                Entry::Occupied(mut occupied) => {
                    let entry = occupied.get_mut();
                    entry.value = value;
                    *entry.last_touched.get_mut() = now;
                    true
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(StampedEntry::new(value, now));
                    false
                }
            }
        };

        if raced {
            // Another insert of this key won; hand back the reserved slot.
            self.live.fetch_sub(1, Ordering::AcqRel);
            self.stats.record_update();
        } else {
            self.stats.record_insert();
        }
    }

    /// Claims one unit of capacity, evicting until one is free.
    ///
    /// The slot is counted before the entry exists, so concurrent inserts
    /// can never push the population past capacity.
    fn reserve_slot(&self) {
        loop {
            let live = self.live.load(Ordering::Acquire);
            if live < self.capacity {
                if self
                    .live
                    .compare_exchange_weak(live, live + 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return;
                }
                continue;
            }
            if !self.evict_oldest() {
                // Victim refreshed or every slot is still being filled.
                std::thread::yield_now();
            }
        }
    }

    // == Get ==
    /// Returns a copy of the value and refreshes its timestamp under the
    /// shard's shared lock.
    pub fn get(&self, key: &K) -> Option<V> {
        let idx = self.shards.index_for(key);
        let now = self.clock.now_ms();
        let found = {
            let map = self.shards.shard(idx).read();
            map.get(key).map(|entry| {
                entry.touch(now);
                entry.value.clone()
            })
        };

        self.stats.record_lookup(found.is_some());
        found
    }

    // == Contains ==
    /// Checks presence without refreshing the timestamp.
    pub fn contains(&self, key: &K) -> bool {
        let idx = self.shards.index_for(key);
        self.shards.shard(idx).read().contains_key(key)
    }

    // == Size ==
    pub fn size(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    // == Clear ==
    /// Empties every shard, locking them in index order.
    ///
    /// The counter drops by exactly the number of removed entries, leaving
    /// reservations of inserts in flight intact.
    pub fn clear(&self) {
        let mut guards = self.shards.lock_all();

        let mut removed = 0;
        for map in guards.iter_mut() {
            removed += map.len();
            map.clear();
        }
        self.live.fetch_sub(removed, Ordering::AcqRel);

        drop(guards);
        info!(removed, "Approximate LRU cache cleared");
    }

    // == Eviction ==
    /// Scans every shard for the oldest entry and removes it.
    ///
    /// Returns false when there was nothing to remove or the victim changed
    /// after the scan.
    fn evict_oldest(&self) -> bool {
        match self.find_victim() {
            Some(victim) => self.evict_victim(victim),
            None => false,
        }
    }

    /// Scan phase: one shard at a time, under its shared lock.
    fn find_victim(&self) -> Option<Victim<K>> {
        let mut victim: Option<Victim<K>> = None;

        for (idx, shard) in self.shards.iter() {
            let map = shard.read();
            for (key, entry) in map.iter() {
                let stamp = entry.stamp();
                if victim.as_ref().map_or(true, |v| stamp < v.stamp) {
                    victim = Some(Victim {
                        key: key.clone(),
                        shard: idx,
                        stamp,
                    });
                }
            }
        }

        victim
    }

    /// Removal phase: erase the victim if it is untouched since the scan.
    fn evict_victim(&self, victim: Victim<K>) -> bool {
        let removed = {
            let mut map = self.shards.shard(victim.shard).write();
            match map.get(&victim.key) {
                Some(entry) if entry.stamp() <= victim.stamp => map.remove(&victim.key).is_some(),
                _ => false,
            }
        };

        if removed {
            self.live.fetch_sub(1, Ordering::AcqRel);
            self.stats.record_eviction();
            trace!(shard = victim.shard, stamp = victim.stamp, "Evicted oldest entry");
        } else {
            self.stats.record_eviction_race();
            trace!(shard = victim.shard, "Eviction victim changed after scan");
        }
        removed
    }

    #[cfg(test)]
    fn mapped_entries(&self) -> usize {
        self.shards.entry_count()
    }
}

impl<K, V> ConcurrentCache<K, V> for ApproxLru<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) {
        ApproxLru::put(self, key, value)
    }

    fn get(&self, key: &K) -> Option<V> {
        ApproxLru::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        ApproxLru::contains(self, key)
    }

    fn size(&self) -> usize {
        ApproxLru::size(self)
    }

    fn clear(&self) {
        ApproxLru::clear(self)
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
