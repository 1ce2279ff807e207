//! Cache Module
//!
//! Concurrent sharded LRU cache with two interchangeable eviction policies:
//! an exact global recency list and a per-entry timestamp approximation.

mod approx;
mod clock;
mod engine;
mod exact;
mod recency;
mod router;
mod shard;
mod stats;

#[cfg(test)]
mod property_tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// Re-export public types
pub use approx::ApproxLru;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use engine::CacheEngine;
pub use exact::ExactLru;
pub use router::ShardRouter;
pub use stats::CacheStats;

// == Cache Contract ==
/// Operations shared by every eviction policy.
///
/// Callers are written against this trait and pick a policy at construction
/// time. A miss is always `None`; no operation other than construction fails.
pub trait ConcurrentCache<K, V>: Send + Sync {
    /// Inserts or replaces `key`, evicting one entry first if the cache is full.
    fn put(&self, key: K, value: V);

    /// Returns a copy of the value and marks the entry as recently used.
    fn get(&self, key: &K) -> Option<V>;

    /// Checks presence without counting as an access.
    fn contains(&self, key: &K) -> bool;

    /// Number of live entries.
    fn size(&self) -> usize;

    /// Removes every entry.
    fn clear(&self);

    /// Maximum number of live entries.
    fn capacity(&self) -> usize;

    fn shard_count(&self) -> usize;

    /// Point-in-time counters.
    fn stats(&self) -> CacheStats;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

// == Policy Kind ==
/// Selects the eviction policy backing a [`CacheEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Global recency list; evicts the true least recently used entry.
    #[default]
    Exact,
    /// Per-entry timestamps scanned at eviction time.
    Approximate,
}

impl FromStr for PolicyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(PolicyKind::Exact),
            "approximate" | "approx" => Ok(PolicyKind::Approximate),
            other => Err(CacheError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Exact => f.write_str("exact"),
            PolicyKind::Approximate => f.write_str("approximate"),
        }
    }
}

// == Construction Checks ==
/// Rejects capacity/shard combinations that cannot form a valid cache.
pub(crate) fn validate_dimensions(capacity: usize, shard_count: usize) -> crate::error::Result<()> {
    if capacity == 0 {
        return Err(CacheError::ZeroCapacity);
    }
    if shard_count == 0 {
        return Err(CacheError::ZeroShards);
    }
    if shard_count > capacity {
        return Err(CacheError::TooManyShards {
            shards: shard_count,
            capacity,
        });
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_kind_from_str() {
        assert_eq!("exact".parse::<PolicyKind>().unwrap(), PolicyKind::Exact);
        assert_eq!(" Approximate ".parse::<PolicyKind>().unwrap(), PolicyKind::Approximate);
        assert_eq!("approx".parse::<PolicyKind>().unwrap(), PolicyKind::Approximate);
        assert!(matches!(
            "fifo".parse::<PolicyKind>(),
            Err(CacheError::UnknownPolicy(_))
        ));
    }

    #[test]
    fn test_policy_kind_display_roundtrips() {
        for kind in [PolicyKind::Exact, PolicyKind::Approximate] {
            assert_eq!(kind.to_string().parse::<PolicyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_policy_kind_deserialize() {
        let kind: PolicyKind = serde_json::from_str("\"approximate\"").unwrap();
        assert_eq!(kind, PolicyKind::Approximate);
    }

    #[test]
    fn test_validate_dimensions() {
        assert_eq!(validate_dimensions(0, 1), Err(CacheError::ZeroCapacity));
        assert_eq!(validate_dimensions(10, 0), Err(CacheError::ZeroShards));
        assert_eq!(
            validate_dimensions(4, 8),
            Err(CacheError::TooManyShards {
                shards: 8,
                capacity: 4
            })
        );
        assert!(validate_dimensions(1, 1).is_ok());
        assert!(validate_dimensions(100, 16).is_ok());
    }
}
