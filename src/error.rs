//! Error types for the decision cache
//!
//! Only construction and configuration can fail. Cache misses are `None`,
//! never an error.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Total capacity was zero
    #[error("Cache capacity must be greater than zero")]
    ZeroCapacity,

    /// Shard count was zero
    #[error("Shard count must be greater than zero")]
    ZeroShards,

    /// More shards than entries
    #[error("Shard count {shards} exceeds cache capacity {capacity}")]
    TooManyShards { shards: usize, capacity: usize },

    /// Eviction policy name not recognised
    #[error("Unknown eviction policy: {0}")]
    UnknownPolicy(String),

    /// A configuration value could not be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidSetting { name: String, value: String },
}

// == Result Type Alias ==
/// Convenience Result type for the decision cache.
pub type Result<T> = std::result::Result<T, CacheError>;
