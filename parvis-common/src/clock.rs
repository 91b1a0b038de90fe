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

use std::{
    fmt::Debug,
    sync::atomic::{AtomicI64, Ordering},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// A UTC instant with millisecond resolution.
///
/// `Timestamp::ZERO` doubles as the "never" sentinel in entry metadata and on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The zero sentinel.
    pub const ZERO: Self = Self(0);

    /// Build a timestamp from whole milliseconds since the Unix epoch.
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Whole milliseconds since the Unix epoch.
    pub const fn as_unix_millis(&self) -> i64 {
        self.0
    }

    /// Whether this is the zero sentinel.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating advance by a duration.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_as_millis(duration)))
    }

    /// Saturating advance by raw milliseconds.
    pub fn saturating_add_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds from `self` until `other`, zero if `other` is not later.
    pub fn millis_until(&self, other: Timestamp) -> i64 {
        other.0.saturating_sub(self.0).max(0)
    }
}

/// Clamp a duration into the `i64` millisecond domain.
pub fn duration_as_millis(duration: Duration) -> i64 {
    duration.as_millis().min(i64::MAX as u128) as i64
}

/// A monotonic-enough UTC source, injectable for testing.
///
/// Backends consult their own clock when classifying entries, so all parts of one cache
/// must share a single clock instance.
pub trait Clock: Send + Sync + Debug + 'static {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().min(i64::MAX as u128) as i64)
            .unwrap_or(0);
        Timestamp::from_unix_millis(millis)
    }
}

/// A manually advanced clock for deterministic expiration tests.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a manual clock starting at the given instant.
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(start.as_unix_millis()),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        self.millis.fetch_add(duration_as_millis(duration), Ordering::SeqCst);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_unix_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.millis.load(Ordering::SeqCst))
    }
}
