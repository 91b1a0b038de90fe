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

use std::{fmt::Debug, future::Future, sync::Arc};

use crate::{error::Result, metadata::EntryMetadata};

/// How a backend stores values. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Live values in an in-process map.
    Object,
    /// Encoded payloads in an external byte store.
    Byte,
}

/// A cached unit: expiration metadata plus a shared value.
pub struct CacheEntry<V> {
    metadata: EntryMetadata,
    value: Arc<V>,
}

impl<V> Debug for CacheEntry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry").field("metadata", &self.metadata).finish()
    }
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata,
            value: self.value.clone(),
        }
    }
}

impl<V> CacheEntry<V> {
    /// Build an entry. The value is shared, never copied.
    pub fn new(metadata: EntryMetadata, value: Arc<V>) -> Self {
        Self { metadata, value }
    }

    /// The entry's expiration metadata.
    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    /// The shared value.
    pub fn value(&self) -> &Arc<V> {
        &self.value
    }

    /// Take the shared value.
    pub fn into_value(self) -> Arc<V> {
        self.value
    }

    /// The same value under refreshed metadata.
    pub fn with_metadata(&self, metadata: EntryMetadata) -> Self {
        Self {
            metadata,
            value: self.value.clone(),
        }
    }
}

/// Outcome of a backend lookup after the backend applied its own clock.
#[derive(Debug)]
pub enum Lookup<V> {
    /// A fresh entry.
    Hit(CacheEntry<V>),
    /// An entry past its expiration but within its stale window.
    Stale(CacheEntry<V>),
    /// The key existed but is past its stale deadline; the backend removed it.
    Expired,
    /// No such key.
    Miss,
}

/// The uniform store contract consumed by the façade.
///
/// Backends classify entries against their own clock: a lookup never returns an entry
/// the clock says is expired, and an expired key is removed before returning. A fresh
/// read of a sliding entry writes the refreshed expiration back before returning.
pub trait Backend<V>: Send + Sync + 'static {
    /// The storage mode, fixed at construction.
    fn mode(&self) -> BackendMode;

    /// Look up and classify the entry under `key`.
    #[must_use]
    fn get(&self, key: &str) -> impl Future<Output = Result<Lookup<V>>> + Send;

    /// Unconditionally replace the entry under `key`.
    #[must_use]
    fn set(&self, key: &str, entry: CacheEntry<V>) -> impl Future<Output = Result<()>> + Send;

    /// Remove the entry under `key`. Idempotent.
    #[must_use]
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
