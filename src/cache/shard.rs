//! Shard Module
//!
//! Independently locked partitions of the key space.

use std::hash::Hash;

use ahash::AHashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cache::ShardRouter;
use crate::error::Result;

// == Shard ==
/// One partition of the key space, guarded by its own reader/writer lock.
///
/// Aligned to a cache line so neighbouring shard locks do not false-share.
#[repr(align(64))]
pub(crate) struct Shard<K, E> {
    map: RwLock<AHashMap<K, E>>,
}

impl<K, E> Shard<K, E> {
    fn new() -> Self {
        Self {
            map: RwLock::new(AHashMap::new()),
        }
    }

    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, AHashMap<K, E>> {
        self.map.read()
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, AHashMap<K, E>> {
        self.map.write()
    }
}

// == Shard Set ==
/// The fixed set of shards owned by one engine, plus the router that picks
/// between them.
pub(crate) struct ShardSet<K, E> {
    shards: Box<[Shard<K, E>]>,
    router: ShardRouter,
}

impl<K: Hash + Eq, E> ShardSet<K, E> {
    pub(crate) fn new(shard_count: usize) -> Result<Self> {
        let router = ShardRouter::new(shard_count)?;
        let shards = (0..shard_count)
            .map(|_| Shard::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self { shards, router })
    }

    #[inline]
    pub(crate) fn index_for(&self, key: &K) -> usize {
        self.router.index_for(key)
    }

    #[inline]
    pub(crate) fn shard(&self, index: usize) -> &Shard<K, E> {
        &self.shards[index]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &Shard<K, E>)> {
        self.shards.iter().enumerate()
    }

    pub(crate) fn len(&self) -> usize {
        self.shards.len()
    }

    /// Write-locks every shard in ascending index order.
    ///
    /// Every multi-shard acquisition goes through here so the order is the
    /// same for all callers.
    pub(crate) fn lock_all(&self) -> Vec<RwLockWriteGuard<'_, AHashMap<K, E>>> {
        self.shards.iter().map(|s| s.write()).collect()
    }

    /// Sum of entries across all shards, locking each in turn.
    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }
}
