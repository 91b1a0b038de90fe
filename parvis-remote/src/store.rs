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

use std::{future::Future, time::Duration};

use bytes::Bytes;

/// The narrow contract an external key/byte-value store must provide.
///
/// Drivers report their own failures as [`anyhow::Error`]; the backend wraps them
/// without inspection.
pub trait ByteStore: Send + Sync + 'static {
    /// Read the blob under `key`, if any.
    #[must_use]
    fn load(&self, key: &str) -> impl Future<Output = anyhow::Result<Option<Bytes>>> + Send;

    /// Write the blob under `key`.
    ///
    /// `retain_for` is the minimum time the store must keep the blob; `None` means
    /// keep it until overwritten or deleted. Stores may keep blobs longer.
    #[must_use]
    fn store(&self, key: &str, blob: Bytes, retain_for: Option<Duration>)
        -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Delete the blob under `key`. Idempotent.
    #[must_use]
    fn delete(&self, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}
