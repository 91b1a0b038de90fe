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

pub use parvis_common::{
    backend::{Backend, BackendMode, CacheEntry, Lookup},
    clock::{Clock, ManualClock, SystemClock, Timestamp},
    code::Code,
    error::{Error, Result},
    metadata::{EntryMetadata, Freshness},
    metrics::{Metrics, MetricsSnapshot},
    singleflight::{KeyedLock, Lease},
};
pub use parvis_memory::ObjectBackend;
pub use parvis_remote::{ByteStore, EnvelopeCodec, RemoteBackend, ENVELOPE_HEADER_LEN};

pub use crate::{builder::CacheBuilder, cache::Cache, options::EntryOptions};
