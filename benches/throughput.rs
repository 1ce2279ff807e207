//! Throughput benchmarks: exact vs approximate eviction.
//!
//! Each group runs the same workload against both policies so criterion
//! can report them side by side.
//!
//! Run with:
//!     cargo bench --bench throughput

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use decision_cache::{CacheEngine, ConcurrentCache, PolicyKind};

/// Capacity of every benchmarked cache.
const CAP: usize = 10_000;

/// Shard count of every benchmarked cache.
const SHARDS: usize = 16;

/// Operations executed per criterion iteration (hot-loop size).
const OPS: u64 = 1_000;

const POLICIES: [PolicyKind; 2] = [PolicyKind::Exact, PolicyKind::Approximate];

fn filled(policy: PolicyKind) -> CacheEngine<u64, u64> {
    let cache = CacheEngine::new(CAP, SHARDS, policy).expect("valid benchmark dimensions");
    for i in 0..CAP as u64 {
        cache.put(i, i * 2);
    }
    cache
}

// ---------------------------------------------------------------------------
// Group 1: get_hit
// ---------------------------------------------------------------------------
// All keys present, no eviction: pure read path.

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit");
    group.throughput(Throughput::Elements(OPS));

    for policy in POLICIES {
        let cache = filled(policy);
        group.bench_function(policy.to_string(), |b| {
            b.iter(|| {
                for i in 0..OPS {
                    black_box(cache.get(black_box(&i)));
                }
            })
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Group 2: insert_evicting
// ---------------------------------------------------------------------------
// Always-new keys against a full cache: every put evicts.

fn bench_insert_evicting(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_evicting");
    group.throughput(Throughput::Elements(OPS));
    // Approximate eviction scans every entry, so keep the sample count low.
    group.sample_size(10);

    for policy in POLICIES {
        let cache = filled(policy);
        let mut next = CAP as u64;
        group.bench_function(policy.to_string(), |b| {
            b.iter(|| {
                for _ in 0..OPS {
                    cache.put(next, next);
                    next += 1;
                }
            })
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Group 3: concurrent_mixed
// ---------------------------------------------------------------------------
// N threads, 90% reads over a key space twice the capacity.

fn bench_concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_mixed");
    group.sample_size(10);

    for threads in [2usize, 8] {
        group.throughput(Throughput::Elements(OPS * threads as u64));
        for policy in POLICIES {
            let cache = Arc::new(filled(policy));
            group.bench_with_input(
                BenchmarkId::new(policy.to_string(), threads),
                &threads,
                |b, &threads| {
                    b.iter(|| {
                        thread::scope(|scope| {
                            for t in 0..threads as u64 {
                                let cache = Arc::clone(&cache);
                                scope.spawn(move || {
                                    for i in 0..OPS {
                                        let key = (i * 7919 + t * 104_729) % (2 * CAP as u64);
                                        if i % 10 == 0 {
                                            cache.put(key, key);
                                        } else {
                                            black_box(cache.get(&key));
                                        }
                                    }
                                });
                            }
                        })
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_get_hit, bench_insert_evicting, bench_concurrent_mixed);
criterion_main!(benches);
