// Copyright 2026 parvis Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic additive counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Add to the counter.
    pub fn increase(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    /// Read the counter.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge that can move both ways.
///
/// Callers must pair every `decrease` with an earlier `increase`; the façade's key
/// tracking guarantees that for `size`.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    /// Add to the gauge.
    pub fn increase(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    /// Subtract from the gauge.
    pub fn decrease(&self, n: u64) {
        self.0.fetch_sub(n, Ordering::Relaxed);
    }

    /// Read the gauge.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cache accounting counters.
///
/// All counters are updated with relaxed atomics; snapshots may be torn across fields.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Fresh hits.
    pub hit: Counter,
    /// Misses, including cache-aside populations.
    pub miss: Counter,
    /// Stale hits.
    pub stale_hit: Counter,
    /// Writes through `set` and cache-aside population.
    pub set: Counter,
    /// Explicit removals, including tag invalidation.
    pub remove: Counter,
    /// Expiration-driven evictions observed by the façade.
    pub evict: Counter,
    /// Keys currently installed from the façade's view.
    pub size: Gauge,
}

impl Metrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all counters. Per-field atomic loads; fields need not be mutually consistent.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hit.get(),
            misses: self.miss.get(),
            stale_hits: self.stale_hit.get(),
            sets: self.set.get(),
            removals: self.remove.get(),
            evictions: self.evict.get(),
            size: self.size.get(),
        }
    }
}

/// A point-in-time read of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Fresh hits.
    pub hits: u64,
    /// Misses.
    pub misses: u64,
    /// Stale hits.
    pub stale_hits: u64,
    /// Writes.
    pub sets: u64,
    /// Explicit removals.
    pub removals: u64,
    /// Expiration-driven evictions.
    pub evictions: u64,
    /// Keys currently installed.
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.hit.increase(3);
        metrics.miss.increase(1);
        metrics.size.increase(2);
        metrics.size.decrease(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits, 3);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.size, 1);
        assert_eq!(snapshot.sets, 0);
    }

    #[test]
    fn test_concurrent_increase() {
        let metrics = std::sync::Arc::new(Metrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.hit.increase(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.hit.get(), 8_000);
    }
}
