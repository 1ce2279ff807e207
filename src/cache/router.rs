//! Shard Router Module
//!
//! Maps keys to shard indices.

use std::hash::Hash;

use ahash::RandomState;

use crate::error::{CacheError, Result};

// == Shard Router ==
/// Routes a key to one of `shard_count` shards.
///
/// The hasher seed is fixed when the router is built, so a key always maps
/// to the same shard for the lifetime of the engine that owns the router.
#[derive(Debug, Clone)]
pub struct ShardRouter {
    shard_count: usize,
    build_hasher: RandomState,
}

impl ShardRouter {
    /// Creates a router with a freshly seeded hasher.
    ///
    /// Fails with [`CacheError::ZeroShards`] if `shard_count` is zero.
    pub fn new(shard_count: usize) -> Result<Self> {
        Self::with_hasher(shard_count, RandomState::new())
    }

    /// Creates a router with a caller-supplied hasher, for reproducible layouts.
    pub fn with_hasher(shard_count: usize, build_hasher: RandomState) -> Result<Self> {
        if shard_count == 0 {
            return Err(CacheError::ZeroShards);
        }
        Ok(Self {
            shard_count,
            build_hasher,
        })
    }

    #[inline]
    pub fn index_for<K: Hash + ?Sized>(&self, key: &K) -> usize {
        let h = self.build_hasher.hash_one(key);
        // High bits avalanche better than low bits for small moduli.
        (((h >> 32) ^ h) as usize) % self.shard_count
    }
}
