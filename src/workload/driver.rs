//! Mixed Workload Driver
//!
//! Runs seeded random get/put/contains traffic against a shared cache.

use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::ConcurrentCache;
use crate::config::WorkloadConfig;

/// Share of non-read operations that are `contains` probes instead of puts.
const CONTAINS_SHARE: f64 = 0.25;

/// How often each worker samples `size()`.
const SIZE_SAMPLE_EVERY: u64 = 256;

/// Value stored for `key`; reads check it to detect torn or misrouted entries.
#[inline]
fn value_for(key: u64) -> u64 {
    key.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

// == Workload Report ==
/// Outcome of one [`run_workload`] call.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub threads: usize,
    pub total_ops: u64,
    pub gets: u64,
    pub hits: u64,
    pub puts: u64,
    pub contains_checks: u64,
    /// Reads that returned a value not written for that key
    pub inconsistent_reads: u64,
    /// Largest `size()` any worker observed
    pub max_observed_size: usize,
    pub final_size: usize,
    pub capacity: usize,
    pub ops_per_sec: f64,
}

impl WorkloadReport {
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.hits as f64 / self.gets as f64
        }
    }
}

/// Per-worker counters, summed after the workers join.
#[derive(Debug, Default)]
struct Tally {
    gets: u64,
    hits: u64,
    puts: u64,
    contains_checks: u64,
    inconsistent_reads: u64,
    max_observed_size: usize,
}

impl Tally {
    fn merge(&mut self, other: Tally) {
        self.gets += other.gets;
        self.hits += other.hits;
        self.puts += other.puts;
        self.contains_checks += other.contains_checks;
        self.inconsistent_reads += other.inconsistent_reads;
        self.max_observed_size = self.max_observed_size.max(other.max_observed_size);
    }
}

// == Run Workload ==
/// Runs `config.threads` workers against `cache` and waits for all of them.
///
/// Every worker derives its own RNG from `config.seed`, so the operation
/// stream is reproducible even though the interleaving is not.
pub fn run_workload<C>(cache: &C, config: &WorkloadConfig) -> WorkloadReport
where
    C: ConcurrentCache<u64, u64> + ?Sized,
{
    info!(
        threads = config.threads,
        ops_per_thread = config.ops_per_thread,
        key_space = config.key_space,
        read_ratio = config.read_ratio,
        "Starting workload"
    );

    let started_at = Utc::now();
    let start = Instant::now();

    let tally = thread::scope(|scope| {
        let workers: Vec<_> = (0..config.threads)
            .map(|worker| scope.spawn(move || run_worker(cache, config, worker)))
            .collect();

        let mut total = Tally::default();
        for handle in workers {
            match handle.join() {
                Ok(t) => total.merge(t),
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        total
    });

    let elapsed = start.elapsed();
    let total_ops = config.ops_per_thread.saturating_mul(config.threads as u64);
    let secs = elapsed.as_secs_f64();
    let final_size = cache.size();

    let report = WorkloadReport {
        started_at,
        elapsed_ms: elapsed.as_millis() as u64,
        threads: config.threads,
        total_ops,
        gets: tally.gets,
        hits: tally.hits,
        puts: tally.puts,
        contains_checks: tally.contains_checks,
        inconsistent_reads: tally.inconsistent_reads,
        max_observed_size: tally.max_observed_size.max(final_size),
        final_size,
        capacity: cache.capacity(),
        ops_per_sec: if secs > 0.0 { total_ops as f64 / secs } else { 0.0 },
    };
    info!(
        elapsed_ms = report.elapsed_ms,
        ops_per_sec = report.ops_per_sec as u64,
        hit_rate = report.hit_rate(),
        "Workload finished"
    );
    report
}

fn run_worker<C>(cache: &C, config: &WorkloadConfig, worker: usize) -> Tally
where
    C: ConcurrentCache<u64, u64> + ?Sized,
{
    let seed = config
        .seed
        .wrapping_add((worker as u64).wrapping_mul(0x2545_F491_4F6C_DD1D));
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tally = Tally::default();

    for op in 0..config.ops_per_thread {
        let key = rng.gen_range(0..config.key_space);

        if rng.gen_bool(config.read_ratio) {
            tally.gets += 1;
            if let Some(value) = cache.get(&key) {
                tally.hits += 1;
                if value != value_for(key) {
                    tally.inconsistent_reads += 1;
                }
            }
        } else if rng.gen_bool(CONTAINS_SHARE) {
            tally.contains_checks += 1;
            cache.contains(&key);
        } else {
            tally.puts += 1;
            cache.put(key, value_for(key));
        }

        if op % SIZE_SAMPLE_EVERY == 0 {
            tally.max_observed_size = tally.max_observed_size.max(cache.size());
        }
    }

    debug!(worker, gets = tally.gets, puts = tally.puts, "Worker finished");
    tally
}
