//! Configuration Module
//!
//! Loads cache and workload settings from environment variables.

use std::env;
use std::str::FromStr;

use tracing::debug;

use crate::cache::{validate_dimensions, PolicyKind};
use crate::error::{CacheError, Result};

// == Cache Config ==
/// Cache construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub capacity: usize,
    /// Number of independently locked shards
    pub shard_count: usize,
    /// Eviction policy
    pub policy: PolicyKind,
}

impl CacheConfig {
    /// Creates a CacheConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum live entries (default: 10000)
    /// - `CACHE_SHARDS` - Shard count (default: 16)
    /// - `CACHE_POLICY` - `exact` or `approximate` (default: exact)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`CacheConfig::from_env`] with a caller-supplied variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            capacity: parse_or(&lookup, "CACHE_CAPACITY", defaults.capacity)?,
            shard_count: parse_or(&lookup, "CACHE_SHARDS", defaults.shard_count)?,
            policy: match lookup("CACHE_POLICY") {
                Some(raw) => raw.parse()?,
                None => defaults.policy,
            },
        };
        config.validate()?;
        debug!(?config, "Cache configuration loaded");
        Ok(config)
    }

    /// Checks the capacity/shard constraints without building a cache.
    pub fn validate(&self) -> Result<()> {
        validate_dimensions(self.capacity, self.shard_count)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            shard_count: 16,
            policy: PolicyKind::Exact,
        }
    }
}

// == Workload Config ==
/// Parameters for the concurrent workload driver.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadConfig {
    /// Worker threads
    pub threads: usize,
    /// Operations issued by each worker
    pub ops_per_thread: u64,
    /// Keys are drawn uniformly from `0..key_space`
    pub key_space: u64,
    /// Fraction of operations that are `get`
    pub read_ratio: f64,
    /// Base RNG seed; each worker derives its own
    pub seed: u64,
}

impl WorkloadConfig {
    /// Creates a WorkloadConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `WORKLOAD_THREADS` - Worker threads (default: 8)
    /// - `WORKLOAD_OPS` - Operations per thread (default: 100000)
    /// - `WORKLOAD_KEY_SPACE` - Distinct keys (default: 50000)
    /// - `WORKLOAD_READ_RATIO` - Share of reads, 0.0 to 1.0 (default: 0.8)
    /// - `WORKLOAD_SEED` - RNG seed (default: 42)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            threads: parse_or(&lookup, "WORKLOAD_THREADS", defaults.threads)?,
            ops_per_thread: parse_or(&lookup, "WORKLOAD_OPS", defaults.ops_per_thread)?,
            key_space: parse_or(&lookup, "WORKLOAD_KEY_SPACE", defaults.key_space)?,
            read_ratio: parse_or(&lookup, "WORKLOAD_READ_RATIO", defaults.read_ratio)?,
            seed: parse_or(&lookup, "WORKLOAD_SEED", defaults.seed)?,
        };
        config.validate()?;
        debug!(?config, "Workload configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(invalid("WORKLOAD_THREADS", self.threads));
        }
        if self.key_space == 0 {
            return Err(invalid("WORKLOAD_KEY_SPACE", self.key_space));
        }
        if !(0.0..=1.0).contains(&self.read_ratio) {
            return Err(invalid("WORKLOAD_READ_RATIO", self.read_ratio));
        }
        if self.ops_per_thread.checked_mul(self.threads as u64).is_none() {
            return Err(invalid("WORKLOAD_OPS", self.ops_per_thread));
        }
        Ok(())
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            ops_per_thread: 100_000,
            key_space: 50_000,
            read_ratio: 0.8,
            seed: 42,
        }
    }
}

// == Helpers ==
fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| CacheError::InvalidSetting {
            name: name.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn invalid(name: &str, value: impl ToString) -> CacheError {
    CacheError::InvalidSetting {
        name: name.to_string(),
        value: value.to_string(),
    }
}
