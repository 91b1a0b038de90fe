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

use std::{fmt::Debug, future::Future, marker::PhantomData, sync::Arc};

use itertools::Itertools;
use parvis_common::{
    backend::{Backend, BackendMode, CacheEntry, Lookup},
    clock::Clock,
    error::{Error, Result},
    metrics::Metrics,
    singleflight::KeyedLock,
};

use crate::{
    options::{validate_key, validate_tag, EntryOptions},
    resolver::{ResolvedPolicy, TtlResolver},
    tags::TagIndex,
    tracker::KeyTracker,
};

pub(crate) struct CacheConfig {
    pub(crate) resolver: TtlResolver,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) stampede_protection: bool,
    pub(crate) stale_while_revalidate: bool,
    pub(crate) shards: usize,
}

/// The caching façade.
///
/// One logical API over an object or byte backend, adding absolute and sliding TTLs,
/// stale-while-revalidate, stampede protection, tag invalidation and metrics. Cheaply
/// clonable; clones share all state.
///
/// Every operation is an `async fn`; dropping its future cancels the operation. A
/// cancelled single-flight wait releases nothing, and background revalidation runs on
/// a detached task that the caller's cancellation never aborts.
pub struct Cache<V, B> {
    inner: Arc<CacheInner<V, B>>,
}

impl<V, B> Debug for Cache<V, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl<V, B> Clone for Cache<V, B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct CacheInner<V, B> {
    backend: B,
    resolver: TtlResolver,
    clock: Arc<dyn Clock>,
    flight: KeyedLock,
    tags: TagIndex,
    tracker: KeyTracker,
    metrics: Metrics,
    stampede_protection: bool,
    stale_while_revalidate: bool,
    _marker: PhantomData<V>,
}

impl<V, B> Cache<V, B>
where
    V: Send + Sync + 'static,
    B: Backend<V>,
{
    pub(crate) fn new(backend: B, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                backend,
                resolver: config.resolver,
                clock: config.clock,
                flight: KeyedLock::new(config.shards),
                tags: TagIndex::new(),
                tracker: KeyTracker::new(config.shards),
                metrics: Metrics::new(),
                stampede_protection: config.stampede_protection,
                stale_while_revalidate: config.stale_while_revalidate,
                _marker: PhantomData,
            }),
        }
    }

    /// The cache accounting counters.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// The storage mode of the underlying backend.
    pub fn mode(&self) -> BackendMode {
        self.inner.backend.mode()
    }

    /// Read the value under `key` if it is fresh or stale.
    ///
    /// A fresh hit of a sliding entry restarts its window. An expired entry is evicted
    /// and reads as absent.
    pub async fn get(&self, key: &str) -> Result<Option<Arc<V>>> {
        Ok(self.lookup(key).await?.map(CacheEntry::into_value))
    }

    /// Whether `key` holds a fresh or stale entry. Accounts like [`Cache::get`].
    pub async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.lookup(key).await?.is_some())
    }

    async fn lookup(&self, key: &str) -> Result<Option<CacheEntry<V>>> {
        validate_key(key)?;
        match self.inner.backend.get(key).await? {
            Lookup::Hit(entry) => {
                self.inner.metrics.hit.increase(1);
                Ok(Some(entry))
            }
            Lookup::Stale(entry) => {
                self.inner.metrics.stale_hit.increase(1);
                Ok(Some(entry))
            }
            Lookup::Expired => {
                self.inner.evict(key);
                Ok(None)
            }
            Lookup::Miss => {
                self.inner.metrics.miss.increase(1);
                Ok(None)
            }
        }
    }

    /// Install `value` under `key`, replacing any prior entry and its tag set.
    pub async fn set(&self, key: &str, value: impl Into<Arc<V>>, options: &EntryOptions) -> Result<()> {
        validate_key(key)?;
        let policy = self.inner.resolver.prepare(options)?;
        self.inner.install(key, value.into(), &policy).await
    }

    /// Read `key`, populating it through `factory` on a miss.
    ///
    /// With stampede protection, concurrent callers of a missing key coalesce into one
    /// factory run and all return its value. With stale-while-revalidate, a stale hit
    /// returns immediately and `factory` refreshes the entry in the background.
    ///
    /// Factory errors propagate unchanged as [`Error::Factory`]; nothing is written.
    pub async fn get_or_set<F, Fut>(&self, key: &str, factory: F, options: &EntryOptions) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        validate_key(key)?;
        let policy = self.inner.resolver.prepare(options)?;

        match self.inner.backend.get(key).await? {
            Lookup::Hit(entry) => {
                self.inner.metrics.hit.increase(1);
                Ok(entry.into_value())
            }
            Lookup::Stale(entry) => {
                self.inner.metrics.stale_hit.increase(1);
                if self.inner.stale_while_revalidate {
                    self.spawn_refresh(key, factory, policy);
                    return Ok(entry.into_value());
                }
                self.populate(key, factory, policy, false).await
            }
            Lookup::Expired => {
                self.inner.evict(key);
                self.populate(key, factory, policy, true).await
            }
            Lookup::Miss => self.populate(key, factory, policy, false).await,
        }
    }

    /// Remove `key`. Idempotent; removing an unknown key still counts a removal.
    pub async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.inner.backend.remove(key).await?;
        if self.inner.tracker.remove(key) {
            self.inner.metrics.size.decrease(1);
        }
        self.inner.metrics.remove.increase(1);
        self.inner.tags.detach(key);
        Ok(())
    }

    /// Remove every key tagged with `tag`.
    pub async fn invalidate_tag(&self, tag: &str) -> Result<()> {
        self.invalidate_tags([tag]).await
    }

    /// Remove every key tagged with any of `tags`. An empty collection is a no-op.
    ///
    /// Removals are counted as removals, not evictions. The key set is a point-in-time
    /// union; keys tagged concurrently may survive.
    pub async fn invalidate_tags<T>(&self, tags: impl IntoIterator<Item = T>) -> Result<()>
    where
        T: AsRef<str>,
    {
        let tags: Vec<T> = tags.into_iter().collect();
        for tag in &tags {
            validate_tag(tag.as_ref())?;
        }
        let keys: Vec<Arc<str>> = tags
            .iter()
            .flat_map(|tag| self.inner.tags.keys_for(tag.as_ref()))
            .unique()
            .collect();
        for key in keys {
            self.remove(&key).await?;
        }
        Ok(())
    }

    /// Cache-aside population. `eviction_recorded` carries whether the caller already
    /// accounted an eviction for this call.
    async fn populate<F, Fut>(
        &self,
        key: &str,
        factory: F,
        policy: ResolvedPolicy,
        eviction_recorded: bool,
    ) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if !self.inner.stampede_protection {
            self.inner.metrics.miss.increase(1);
            return self.inner.run_factory(key, factory, &policy).await;
        }

        let _lease = self.inner.flight.acquire(key).await;

        // Double-check under the lease: another caller may have populated the key.
        match self.inner.backend.get(key).await? {
            Lookup::Hit(entry) => {
                self.inner.metrics.hit.increase(1);
                return Ok(entry.into_value());
            }
            Lookup::Expired => {
                if !eviction_recorded {
                    self.inner.evict(key);
                }
            }
            Lookup::Stale(_) | Lookup::Miss => {}
        }

        self.inner.metrics.miss.increase(1);
        self.inner.run_factory(key, factory, &policy).await
    }

    /// Kick off a background revalidation unless one is already running for `key`.
    ///
    /// The task owns its lease and its own cancellation scope; failures are logged and
    /// swallowed, leaving the stale entry in place until its window ends.
    fn spawn_refresh<F, Fut>(&self, key: &str, factory: F, policy: ResolvedPolicy)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let Some(lease) = self.inner.flight.try_acquire(key) else {
            return;
        };
        let inner = self.inner.clone();
        let key: Arc<str> = Arc::from(key);
        tokio::spawn(async move {
            let _lease = lease;
            tracing::trace!("[refresh]: revalidating key {key}");
            match factory().await {
                Ok(value) => {
                    if let Err(err) = inner.install(&key, Arc::new(value), &policy).await {
                        tracing::error!("[refresh]: install failed, key: {key}, error: {err}");
                    }
                }
                Err(err) => {
                    tracing::error!("[refresh]: factory failed, key: {key}, error: {err}");
                }
            }
        });
    }
}

impl<V, B> CacheInner<V, B>
where
    V: Send + Sync + 'static,
    B: Backend<V>,
{
    async fn run_factory<F, Fut>(&self, key: &str, factory: F, policy: &ResolvedPolicy) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        let value = factory().await.map_err(Error::Factory)?;
        let value = Arc::new(value);
        self.install(key, value.clone(), policy).await?;
        Ok(value)
    }

    /// Backend write plus façade bookkeeping: key tracking, counters, tag replacement.
    async fn install(&self, key: &str, value: Arc<V>, policy: &ResolvedPolicy) -> Result<()> {
        let metadata = policy.materialize(self.clock.now());
        self.backend.set(key, CacheEntry::new(metadata, value)).await?;

        if self.tracker.insert(key) {
            self.metrics.size.increase(1);
        }
        self.metrics.set.increase(1);

        let key: Arc<str> = Arc::from(key);
        self.tags.associate(&key, &policy.tags);
        Ok(())
    }

    /// Bookkeeping for a key the backend reported expired (and already removed).
    fn evict(&self, key: &str) {
        if self.tracker.remove(key) {
            self.metrics.evict.increase(1);
            self.metrics.size.decrease(1);
        }
        self.tags.detach(key);
    }
}
