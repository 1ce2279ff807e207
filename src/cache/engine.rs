//! Cache Engine Module
//!
//! Policy-agnostic façade over [`ExactLru`] and [`ApproxLru`].

use std::hash::Hash;

use tracing::info;

use crate::cache::{ApproxLru, CacheStats, ConcurrentCache, ExactLru, PolicyKind};
use crate::config::CacheConfig;
use crate::error::Result;

// == Cache Engine ==
/// A concurrent bounded cache whose eviction policy is chosen at
/// construction time.
///
/// # Example
/// ```
/// use decision_cache::{CacheEngine, ConcurrentCache, PolicyKind};
///
/// let cache: CacheEngine<String, bool> = CacheEngine::new(1_000, 16, PolicyKind::Exact).unwrap();
/// cache.put("sha256:ab12".to_string(), true);
/// assert_eq!(cache.get(&"sha256:ab12".to_string()), Some(true));
/// assert!(!cache.contains(&"sha256:ffff".to_string()));
/// ```
pub struct CacheEngine<K, V> {
    inner: Box<dyn ConcurrentCache<K, V>>,
    policy: PolicyKind,
}

impl<K, V> CacheEngine<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Builds an engine with the given capacity, shard count and policy.
    pub fn new(capacity: usize, shard_count: usize, policy: PolicyKind) -> Result<Self> {
        let inner: Box<dyn ConcurrentCache<K, V>> = match policy {
            PolicyKind::Exact => Box::new(ExactLru::new(capacity, shard_count)?),
            PolicyKind::Approximate => Box::new(ApproxLru::new(capacity, shard_count)?),
        };
        info!(capacity, shard_count, policy = %policy, "Cache engine initialized");

        Ok(Self { inner, policy })
    }

    /// Builds an engine from a loaded [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.capacity, config.shard_count, config.policy)
    }

    /// Wraps an already constructed policy.
    pub fn from_policy<C>(policy: PolicyKind, cache: C) -> Self
    where
        C: ConcurrentCache<K, V> + 'static,
    {
        Self {
            inner: Box::new(cache),
            policy,
        }
    }

    pub fn policy(&self) -> PolicyKind {
        self.policy
    }
}

impl<K, V> ConcurrentCache<K, V> for CacheEngine<K, V> {
    #[inline]
    fn put(&self, key: K, value: V) {
        self.inner.put(key, value)
    }

    #[inline]
    fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    #[inline]
    fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn clear(&self) {
        self.inner.clear()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn shard_count(&self) -> usize {
        self.inner.shard_count()
    }

    fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}
