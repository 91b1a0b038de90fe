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

use std::{hash::BuildHasher, sync::Arc};

use ahash::RandomState;
use hashbrown::HashSet;
use parking_lot::Mutex;

/// The set of keys the façade has installed and not yet removed or evicted.
///
/// Backs the `size` gauge: only transitions observed here move it, so repeated sets
/// and removes of unknown keys cannot drift the count.
#[derive(Debug)]
pub(crate) struct KeyTracker {
    shards: Box<[Mutex<HashSet<Arc<str>>>]>,
    hasher: RandomState,
}

impl KeyTracker {
    pub(crate) fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| Mutex::new(HashSet::new())).collect();
        Self {
            shards,
            hasher: RandomState::default(),
        }
    }

    /// Track `key`; `true` if it was newly installed.
    pub(crate) fn insert(&self, key: &str) -> bool {
        self.shard(key).lock().insert(Arc::from(key))
    }

    /// Forget `key`; `true` if it was tracked.
    pub(crate) fn remove(&self, key: &str) -> bool {
        self.shard(key).lock().remove(key)
    }

    fn shard(&self, key: &str) -> &Mutex<HashSet<Arc<str>>> {
        let hash = self.hasher.hash_one(key) as usize;
        &self.shards[hash % self.shards.len()]
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }
}
