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

use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;
use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::store::ByteStore;

/// An in-memory [`ByteStore`] that records retention hints and exposes raw blobs,
/// for tests that need to inspect or corrupt what reached the store.
#[derive(Debug, Default, Clone)]
pub struct MemoryByteStore {
    inner: Arc<Mutex<HashMap<String, StoredBlob>>>,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    blob: Bytes,
    retain_for: Option<Duration>,
}

impl MemoryByteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw blob under `key`, bypassing the backend.
    pub fn raw(&self, key: &str) -> Option<Bytes> {
        self.inner.lock().get(key).map(|stored| stored.blob.clone())
    }

    /// Overwrite the raw blob under `key`, bypassing the backend.
    pub fn put_raw(&self, key: &str, blob: Bytes) {
        self.inner.lock().insert(
            key.to_string(),
            StoredBlob {
                blob,
                retain_for: None,
            },
        );
    }

    /// The retention hint recorded with the last `store` of `key`.
    pub fn retention(&self, key: &str) -> Option<Option<Duration>> {
        self.inner.lock().get(key).map(|stored| stored.retain_for)
    }

    /// Number of blobs held.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl ByteStore for MemoryByteStore {
    fn load(&self, key: &str) -> impl Future<Output = anyhow::Result<Option<Bytes>>> + Send {
        let blob = self.raw(key);
        async move { Ok(blob) }
    }

    fn store(
        &self,
        key: &str,
        blob: Bytes,
        retain_for: Option<Duration>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send {
        self.inner
            .lock()
            .insert(key.to_string(), StoredBlob { blob, retain_for });
        async move { Ok(()) }
    }

    fn delete(&self, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send {
        self.inner.lock().remove(key);
        async move { Ok(()) }
    }
}
