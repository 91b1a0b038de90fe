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

use std::time::Duration;

use crate::clock::{duration_as_millis, Timestamp};

/// Classification of an entry against a clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Within the absolute expiration (or never expiring).
    Fresh,
    /// Past the absolute expiration but within the stale window.
    Stale,
    /// Past the stale deadline.
    Expired,
}

/// Expiration policy attached to a cached entry. Immutable after construction;
/// sliding refreshes produce a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    created_at: Timestamp,
    /// `Timestamp::ZERO` = never expires.
    expires_at: Timestamp,
    /// Sliding window in millis, `0` = not sliding.
    sliding_millis: i64,
    /// Stale window in millis, `0` = no stale window.
    stale_millis: i64,
}

impl EntryMetadata {
    /// A never-expiring entry created at the given instant.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            created_at,
            expires_at: Timestamp::ZERO,
            sliding_millis: 0,
            stale_millis: 0,
        }
    }

    /// Pin the absolute expiration instant.
    pub fn with_absolute_expiration(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Make the entry sliding: the expiration restarts at `created_at + window` and is
    /// recomputed on every fresh read.
    pub fn with_sliding_window(mut self, window: Duration) -> Self {
        self.sliding_millis = duration_as_millis(window);
        self.expires_at = self.created_at.saturating_add_millis(self.sliding_millis);
        self
    }

    /// Attach a stale window after the absolute expiration.
    pub fn with_stale_window(mut self, window: Duration) -> Self {
        self.stale_millis = duration_as_millis(window);
        self
    }

    /// Rebuild metadata from the raw wire representation. No validation is applied;
    /// the envelope decoder owns structural checks.
    pub fn from_raw_parts(created_at: i64, expires_at: i64, sliding_millis: i64, stale_millis: i64) -> Self {
        Self {
            created_at: Timestamp::from_unix_millis(created_at),
            expires_at: Timestamp::from_unix_millis(expires_at),
            sliding_millis,
            stale_millis,
        }
    }

    /// The raw wire representation: `(created_at, expires_at, sliding, stale)` millis.
    pub fn raw_parts(&self) -> (i64, i64, i64, i64) {
        (
            self.created_at.as_unix_millis(),
            self.expires_at.as_unix_millis(),
            self.sliding_millis,
            self.stale_millis,
        )
    }

    /// Creation instant.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Absolute expiration instant; `Timestamp::ZERO` = never expires.
    pub fn absolute_expiration(&self) -> Timestamp {
        self.expires_at
    }

    /// The sliding window, if this is a sliding entry.
    pub fn sliding_window(&self) -> Option<Duration> {
        (self.sliding_millis > 0).then(|| Duration::from_millis(self.sliding_millis as u64))
    }

    /// The stale window, if one is set.
    pub fn stale_window(&self) -> Option<Duration> {
        (self.stale_millis > 0).then(|| Duration::from_millis(self.stale_millis as u64))
    }

    /// The instant past which the entry is expired outright.
    pub fn stale_deadline(&self) -> Timestamp {
        self.expires_at.saturating_add_millis(self.stale_millis)
    }

    /// The instant a byte store must retain the entry until, `None` = forever.
    pub fn retain_until(&self) -> Option<Timestamp> {
        (!self.expires_at.is_zero()).then(|| self.stale_deadline())
    }

    /// Classify the entry against the given clock reading.
    pub fn classify(&self, now: Timestamp) -> Freshness {
        if self.expires_at.is_zero() || now <= self.expires_at {
            return Freshness::Fresh;
        }
        if self.stale_millis != 0 && now <= self.stale_deadline() {
            return Freshness::Stale;
        }
        Freshness::Expired
    }

    /// Recompute the absolute expiration of a sliding entry after a fresh read.
    ///
    /// `created_at`, the sliding window and the stale window never change.
    pub fn refreshed(&self, now: Timestamp) -> Self {
        if self.sliding_millis == 0 {
            return *self;
        }
        Self {
            expires_at: now.saturating_add_millis(self.sliding_millis),
            ..*self
        }
    }
}
