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

use std::{fmt::Debug, future::Future, hash::BuildHasher, sync::Arc};

use ahash::RandomState;
use hashbrown::HashMap;
use parking_lot::RwLock;
use parvis_common::{
    backend::{Backend, BackendMode, CacheEntry, Lookup},
    clock::Clock,
    error::Result,
    metadata::Freshness,
};

const DEFAULT_SHARDS: usize = 64;

type Shard<V> = RwLock<HashMap<Arc<str>, CacheEntry<V>>>;

/// An in-process map of live values, sharded by key hash.
///
/// Values are handed over as `Arc<V>` and shared with readers, never copied. Writes are
/// last-writer-wins; a sliding read's refresh write-back races with concurrent writers
/// under the same rule.
pub struct ObjectBackend<V> {
    shards: Box<[Shard<V>]>,
    hasher: RandomState,
    clock: Arc<dyn Clock>,
}

impl<V> Debug for ObjectBackend<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBackend")
            .field("shards", &self.shards.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl<V> ObjectBackend<V> {
    /// Create a backend on the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_shards(clock, DEFAULT_SHARDS)
    }

    /// Create a backend with an explicit shard count.
    pub fn with_shards(clock: Arc<dyn Clock>, shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| RwLock::new(HashMap::new())).collect();
        Self {
            shards,
            hasher: RandomState::default(),
            clock,
        }
    }

    fn shard(&self, key: &str) -> &Shard<V> {
        let hash = self.hasher.hash_one(key) as usize;
        &self.shards[hash % self.shards.len()]
    }

    fn lookup(&self, key: &str) -> Lookup<V> {
        let now = self.clock.now();
        let shard = self.shard(key);

        let entry = match shard.read().get(key) {
            Some(entry) => entry.clone(),
            None => return Lookup::Miss,
        };

        match entry.metadata().classify(now) {
            Freshness::Fresh => {
                if entry.metadata().sliding_window().is_some() {
                    let refreshed = entry.with_metadata(entry.metadata().refreshed(now));
                    shard.write().insert(Arc::from(key), refreshed.clone());
                    Lookup::Hit(refreshed)
                } else {
                    Lookup::Hit(entry)
                }
            }
            Freshness::Stale => Lookup::Stale(entry),
            Freshness::Expired => {
                shard.write().remove(key);
                Lookup::Expired
            }
        }
    }
}

impl<V> Backend<V> for ObjectBackend<V>
where
    V: Send + Sync + 'static,
{
    fn mode(&self) -> BackendMode {
        BackendMode::Object
    }

    fn get(&self, key: &str) -> impl Future<Output = Result<Lookup<V>>> + Send {
        async move { Ok(self.lookup(key)) }
    }

    fn set(&self, key: &str, entry: CacheEntry<V>) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.shard(key).write().insert(Arc::from(key), entry);
            Ok(())
        }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.shard(key).write().remove(key);
            Ok(())
        }
    }
}
