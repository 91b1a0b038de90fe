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

use std::{fmt::Debug, future::Future, marker::PhantomData, sync::Arc, time::Duration};

use parvis_common::{
    backend::{Backend, BackendMode, CacheEntry, Lookup},
    clock::Clock,
    code::Code,
    error::{Error, Result},
    metadata::{EntryMetadata, Freshness},
};

use crate::{envelope::EnvelopeCodec, store::ByteStore};

/// Minimum retention asked of the external store.
const RETENTION_FLOOR: Duration = Duration::from_secs(1);

/// Adapter that carries typed entries across an external byte store.
///
/// Every write serializes `(metadata, payload)` through the envelope codec and asks the
/// store to retain the blob until at least the stale deadline. Undecodable blobs are
/// purged and reported as expired.
pub struct RemoteBackend<V, S> {
    store: S,
    clock: Arc<dyn Clock>,
    _marker: PhantomData<fn() -> V>,
}

impl<V, S> Debug for RemoteBackend<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackend").field("clock", &self.clock).finish()
    }
}

impl<V, S> RemoteBackend<V, S>
where
    V: Code,
    S: ByteStore,
{
    /// Wrap an external store on the given clock.
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            _marker: PhantomData,
        }
    }

    fn retention(&self, metadata: &EntryMetadata) -> Option<Duration> {
        metadata.retain_until().map(|until| {
            let millis = self.clock.now().millis_until(until) as u64;
            Duration::from_millis(millis).max(RETENTION_FLOOR)
        })
    }

    /// Drop an undecodable entry and report it expired.
    async fn purge(&self, key: &str, err: Error) -> Result<Lookup<V>> {
        tracing::warn!("[remote backend]: purging undecodable entry, key: {key}, error: {err}");
        self.store.delete(key).await.map_err(Error::Store)?;
        Ok(Lookup::Expired)
    }

    async fn lookup(&self, key: &str) -> Result<Lookup<V>> {
        let blob = match self.store.load(key).await.map_err(Error::Store)? {
            Some(blob) => blob,
            None => return Ok(Lookup::Miss),
        };

        let (metadata, payload) = match EnvelopeCodec::decode(&blob) {
            Ok(decoded) => decoded,
            Err(err) => return self.purge(key, err).await,
        };

        let now = self.clock.now();
        match metadata.classify(now) {
            Freshness::Expired => {
                self.store.delete(key).await.map_err(Error::Store)?;
                Ok(Lookup::Expired)
            }
            Freshness::Stale => {
                let value = match V::decode(&payload) {
                    Ok(value) => value,
                    Err(err) => return self.purge(key, err).await,
                };
                Ok(Lookup::Stale(CacheEntry::new(metadata, Arc::new(value))))
            }
            Freshness::Fresh => {
                let value = match V::decode(&payload) {
                    Ok(value) => value,
                    Err(err) => return self.purge(key, err).await,
                };
                let metadata = if metadata.sliding_window().is_some() {
                    let refreshed = metadata.refreshed(now);
                    // A lost refresh only shortens the effective window by one read, so
                    // a write-back failure downgrades to a warning.
                    let blob = EnvelopeCodec::encode(&refreshed, &payload)?;
                    if let Err(err) = self.store.store(key, blob, self.retention(&refreshed)).await {
                        tracing::warn!("[remote backend]: sliding refresh write-back failed, key: {key}, error: {err}");
                        metadata
                    } else {
                        refreshed
                    }
                } else {
                    metadata
                };
                Ok(Lookup::Hit(CacheEntry::new(metadata, Arc::new(value))))
            }
        }
    }
}

impl<V, S> Backend<V> for RemoteBackend<V, S>
where
    V: Code,
    S: ByteStore,
{
    fn mode(&self) -> BackendMode {
        BackendMode::Byte
    }

    fn get(&self, key: &str) -> impl Future<Output = Result<Lookup<V>>> + Send {
        self.lookup(key)
    }

    fn set(&self, key: &str, entry: CacheEntry<V>) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mut payload = Vec::with_capacity(entry.value().encoded_len());
            entry.value().encode(&mut payload);
            let blob = EnvelopeCodec::encode(entry.metadata(), &payload)?;
            let retain_for = self.retention(entry.metadata());
            self.store.store(key, blob, retain_for).await.map_err(Error::Store)
        }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        async move { self.store.delete(key).await.map_err(Error::Store) }
    }
}
