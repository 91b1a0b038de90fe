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

//! Shared components and utils for parvis.

/// The backend contract shared by the object and byte backends.
pub mod backend;
/// The injectable clock and the timestamp type.
pub mod clock;
/// The trait for value encoding and decoding across the byte backend.
pub mod code;
/// The shared error type.
pub mod error;
/// Entry metadata and freshness classification.
pub mod metadata;
/// Lock-free counters for cache accounting.
pub mod metrics;
/// Per-key mutual exclusion with blocking and try-acquire.
pub mod singleflight;
