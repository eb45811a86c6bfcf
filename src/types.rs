//! Core data types shared by the server and the load generator

use std::sync::atomic::{AtomicU64, Ordering};

/// Key type: a 32-bit signed integer parsed from the URL path
pub type Key = i32;

/// Upper bound of the full key domain
pub const KEY_DOMAIN_MAX: Key = 1_000_000_000;

/// Upper bound of the primary keyspace used by `get_all`
pub const PRIMARY_KEYSPACE_MAX: Key = 1_000_000;

/// First key of the large write-only space used by the mixed workload
pub const LARGE_KEYSPACE_MIN: Key = PRIMARY_KEYSPACE_MAX + 1;

/// Largest key in the popular set used by `get_popular` and `mixed`
pub const POPULAR_KEY_MAX: Key = 100;

/// Request counters shared across all handler tasks
///
/// `total_gets` is bumped before the cache probe and never rolled back;
/// `cache_hits` only on confirmed hits.
#[derive(Debug, Default)]
pub struct ServerStats {
    total_gets: AtomicU64,
    cache_hits: AtomicU64,
}

impl ServerStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming GET, before the cache is consulted
    pub fn record_get(&self) {
        self.total_gets.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a confirmed cache hit
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Total GET requests observed
    pub fn total_gets(&self) -> u64 {
        self.total_gets.load(Ordering::Relaxed)
    }

    /// Total cache hits observed
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }
}

/// Aggregated load-generator counters
///
/// Workers accumulate privately and fold their totals in once, on exit.
/// Only successful (200) requests contribute to the latency accumulator.
#[derive(Debug, Default)]
pub struct LoadTotals {
    requests: AtomicU64,
    errors: AtomicU64,
    latency_micros: AtomicU64,
}

impl LoadTotals {
    /// Create zeroed totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one worker's private counters into the shared totals
    pub fn fold(&self, requests: u64, errors: u64, latency_micros: u64) {
        self.requests.fetch_add(requests, Ordering::Relaxed);
        self.errors.fetch_add(errors, Ordering::Relaxed);
        self.latency_micros.fetch_add(latency_micros, Ordering::Relaxed);
    }

    /// Successful requests across all workers
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Errors across all workers
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Accumulated round-trip time of successful requests, in microseconds
    pub fn latency_micros(&self) -> u64 {
        self.latency_micros.load(Ordering::Relaxed)
    }

    /// Mean response time in milliseconds, 0.0 when nothing succeeded
    pub fn avg_response_ms(&self) -> f64 {
        let requests = self.requests();
        if requests == 0 {
            return 0.0;
        }
        self.latency_micros() as f64 / requests as f64 / 1000.0
    }
}
