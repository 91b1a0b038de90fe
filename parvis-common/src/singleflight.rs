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
use hashbrown::HashMap;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

const DEFAULT_SHARDS: usize = 64;

/// Per-key mutual exclusion.
///
/// For any key at most one [`Lease`] exists at a time. The per-key slot is reclaimed
/// when its last registrant leaves, so the table size tracks the active contention set
/// rather than the cardinality of keys ever touched.
#[derive(Debug, Clone)]
pub struct KeyedLock {
    inner: Arc<Shards>,
}

#[derive(Debug)]
struct Shards {
    shards: Box<[Mutex<HashMap<Arc<str>, Slot>>]>,
    hasher: RandomState,
}

#[derive(Debug)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    registrants: usize,
}

impl Default for KeyedLock {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

impl KeyedLock {
    /// Create a table with the given shard count.
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| Mutex::new(HashMap::new())).collect();
        Self {
            inner: Arc::new(Shards {
                shards,
                hasher: RandomState::default(),
            }),
        }
    }

    /// Await exclusive ownership of `key`.
    ///
    /// Dropping the returned lease releases the key on every exit path. Dropping the
    /// future before it resolves abandons the wait and releases nothing.
    pub async fn acquire(&self, key: &str) -> Lease {
        let (mutex, registration) = self.register(key);
        let guard = mutex.lock_owned().await;
        Lease {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Take the key if it is free, `None` if another lease is live.
    pub fn try_acquire(&self, key: &str) -> Option<Lease> {
        let (mutex, registration) = self.register(key);
        match mutex.try_lock_owned() {
            Ok(guard) => Some(Lease {
                _guard: guard,
                _registration: registration,
            }),
            Err(_) => None,
        }
    }

    /// Number of keys with a live lease or waiter. Diagnostic only.
    pub fn active_keys(&self) -> usize {
        self.inner.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    fn register(&self, key: &str) -> (Arc<AsyncMutex<()>>, Registration) {
        let mut shard = self.shard(key).lock();
        let mutex = match shard.get_mut(key) {
            Some(slot) => {
                slot.registrants += 1;
                slot.mutex.clone()
            }
            None => {
                let mutex = Arc::new(AsyncMutex::new(()));
                shard.insert(
                    Arc::from(key),
                    Slot {
                        mutex: mutex.clone(),
                        registrants: 1,
                    },
                );
                mutex
            }
        };
        drop(shard);
        (
            mutex,
            Registration {
                table: self.clone(),
                key: Arc::from(key),
            },
        )
    }

    fn deregister(&self, key: &str) {
        let mut shard = self.shard(key).lock();
        if let Some(slot) = shard.get_mut(key) {
            slot.registrants -= 1;
            if slot.registrants == 0 {
                shard.remove(key);
            }
        }
    }

    fn shard(&self, key: &str) -> &Mutex<HashMap<Arc<str>, Slot>> {
        let hash = self.inner.hasher.hash_one(key) as usize;
        &self.inner.shards[hash % self.inner.shards.len()]
    }
}

/// Exclusive ownership of a key. Released on drop.
#[derive(Debug)]
pub struct Lease {
    // Field order matters: the guard must unlock before the registration leaves the
    // table, or a concurrent register could observe an empty slot with a held mutex.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

#[derive(Debug)]
struct Registration {
    table: KeyedLock,
    key: Arc<str>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.table.deregister(&self.key);
    }
}
