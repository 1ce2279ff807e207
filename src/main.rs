//! Decision Cache soak runner
//!
//! Builds a cache from environment configuration, hammers it from many
//! threads, and reports throughput and statistics.

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use decision_cache::{run_workload, CacheConfig, CacheEngine, ConcurrentCache, WorkloadConfig};

/// Main entry point for the soak runner.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load cache and workload configuration from environment variables
/// 3. Build the cache engine with the configured policy
/// 4. Run the concurrent workload
/// 5. Log the report and final statistics as JSON
/// 6. Fail if the capacity bound or read consistency was violated
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "decision_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting decision cache soak run");

    let cache_config = CacheConfig::from_env().context("invalid cache configuration")?;
    let workload_config = WorkloadConfig::from_env().context("invalid workload configuration")?;
    info!(
        "Configuration loaded: capacity={}, shards={}, policy={}, threads={}, ops_per_thread={}",
        cache_config.capacity,
        cache_config.shard_count,
        cache_config.policy,
        workload_config.threads,
        workload_config.ops_per_thread
    );

    let engine: CacheEngine<u64, u64> =
        CacheEngine::from_config(&cache_config).context("failed to build cache engine")?;

    let report = run_workload(&engine, &workload_config);
    info!("Workload report: {}", serde_json::to_string_pretty(&report)?);
    info!("Cache statistics: {}", serde_json::to_string(&engine.stats())?);

    if report.max_observed_size > cache_config.capacity {
        bail!(
            "observed {} live entries, capacity is {}",
            report.max_observed_size,
            cache_config.capacity
        );
    }
    if report.inconsistent_reads > 0 {
        bail!("{} reads returned a value not written for their key", report.inconsistent_reads);
    }

    info!("Soak run complete");
    Ok(())
}
