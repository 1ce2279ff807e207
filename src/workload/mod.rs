//! Workload Module
//!
//! Drives a cache from many threads at once to measure throughput and
//! check the capacity bound under contention.
//!
//! # Workloads
//! - Mixed: seeded random get/put/contains over a bounded key space

mod driver;

pub use driver::{run_workload, WorkloadReport};
