//! Decision Cache - a concurrent sharded LRU cache
//!
//! Bounded in-process cache for "have we already decided this?" lookups,
//! with exact and approximate LRU eviction behind one interface.

pub mod cache;
pub mod config;
pub mod error;
pub mod workload;

pub use cache::{
    ApproxLru, CacheEngine, CacheStats, Clock, ConcurrentCache, ExactLru, ManualClock,
    MonotonicClock, PolicyKind, ShardRouter,
};
pub use config::{CacheConfig, WorkloadConfig};
pub use error::{CacheError, Result};
pub use workload::{run_workload, WorkloadReport};
