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

use std::{sync::Arc, time::Duration};

use parvis_common::{
    clock::{Clock, SystemClock},
    code::Code,
    error::Result,
};
use parvis_memory::ObjectBackend;
use parvis_remote::{ByteStore, RemoteBackend};

use crate::{
    cache::{Cache, CacheConfig},
    options::EntryOptions,
    resolver::TtlResolver,
};

const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_SHARDS: usize = 64;

/// Builder for a [`Cache`].
///
/// Global defaults and category registrations are validated when the terminal
/// [`memory`](CacheBuilder::memory) or [`remote`](CacheBuilder::remote) step runs.
#[derive(Debug)]
pub struct CacheBuilder {
    default_ttl: Duration,
    default_sliding: Option<Duration>,
    default_stale_ttl: Option<Duration>,
    stampede_protection: bool,
    stale_while_revalidate: bool,
    clock: Arc<dyn Clock>,
    categories: Vec<(String, EntryOptions)>,
    shards: usize,
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBuilder {
    /// Create a builder with the stock defaults.
    pub fn new() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            default_sliding: None,
            default_stale_ttl: None,
            stampede_protection: true,
            stale_while_revalidate: true,
            clock: Arc::new(SystemClock),
            categories: Vec::new(),
            shards: DEFAULT_SHARDS,
        }
    }

    /// Set the TTL applied when no layer specifies one. Must be positive.
    ///
    /// Default: 5 minutes.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set a global sliding window, preferred over the default TTL for entries that
    /// specify neither.
    ///
    /// Default: none.
    pub fn with_default_sliding(mut self, window: Duration) -> Self {
        self.default_sliding = Some(window);
        self
    }

    /// Set a global stale window, enabling stale-while-revalidate for entries that do
    /// not set their own.
    ///
    /// Default: none.
    pub fn with_default_stale_ttl(mut self, window: Duration) -> Self {
        self.default_stale_ttl = Some(window);
        self
    }

    /// Enable or disable single-flight coalescing of cache-aside populations.
    ///
    /// Default: enabled.
    pub fn with_stampede_protection(mut self, enabled: bool) -> Self {
        self.stampede_protection = enabled;
        self
    }

    /// Enable or disable background revalidation of stale hits in `get_or_set`.
    /// When disabled, a stale hit repopulates synchronously.
    ///
    /// Default: enabled.
    pub fn with_stale_while_revalidate(mut self, enabled: bool) -> Self {
        self.stale_while_revalidate = enabled;
        self
    }

    /// Inject the clock shared by the façade and its backend.
    ///
    /// Default: the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a named set of default entry options, selectable per operation via
    /// [`EntryOptions::with_category`]. Validated at build time.
    pub fn with_category(mut self, name: impl Into<String>, options: EntryOptions) -> Self {
        self.categories.push((name.into(), options));
        self
    }

    /// Set the shard count of the internal concurrent structures.
    ///
    /// Default: 64.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Build a cache over the in-process object backend.
    pub fn memory<V>(self) -> Result<Cache<V, ObjectBackend<V>>>
    where
        V: Send + Sync + 'static,
    {
        let shards = self.shards;
        let clock = self.clock.clone();
        let config = self.into_config()?;
        let backend = ObjectBackend::with_shards(clock, shards);
        Ok(Cache::new(backend, config))
    }

    /// Build a cache over the given external byte store.
    pub fn remote<V, S>(self, store: S) -> Result<Cache<V, RemoteBackend<V, S>>>
    where
        V: Code,
        S: ByteStore,
    {
        let clock = self.clock.clone();
        let config = self.into_config()?;
        let backend = RemoteBackend::new(store, clock);
        Ok(Cache::new(backend, config))
    }

    fn into_config(self) -> Result<CacheConfig> {
        let resolver = TtlResolver::new(
            self.default_ttl,
            self.default_sliding,
            self.default_stale_ttl,
            self.categories,
        )?;
        Ok(CacheConfig {
            resolver,
            clock: self.clock,
            stampede_protection: self.stampede_protection,
            stale_while_revalidate: self.stale_while_revalidate,
            shards: self.shards,
        })
    }
}
